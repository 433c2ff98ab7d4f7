use std::any::type_name;

use kube::Resource;

pub fn pretty_type_name<'a, T>() -> &'a str {
    type_name::<T>().split("::").last().unwrap_or_default()
}

/// Converts a name into something EDA accepts as a resource name
/// (lowercase alphanumerics, `.` and `-`, starting and ending with an alphanumeric).
pub fn normalize_name(name: &str) -> String {
    let lowered = name.to_lowercase().replace(['_', ' '], "-");
    let mut safe_name = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '.' || *c == '-')
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '-')
        .to_owned();

    if !safe_name.starts_with(|c: char| c.is_alphanumeric()) {
        safe_name.insert(0, 'x');
    }

    if !safe_name.ends_with(|c: char| c.is_alphanumeric()) {
        safe_name.push('0');
    }

    safe_name
}

pub trait With<F> {
    fn with(self, op: F) -> Self;
}

impl<T, F> With<F> for T
where
    F: FnOnce(&mut Self),
{
    fn with(mut self, op: F) -> Self {
        op(&mut self);

        self
    }
}

pub trait RequireMetadata<E> {
    fn require_name_or(&self, error: E) -> Result<&str, E>;
    fn require_name_or_else(&self, error: impl FnOnce() -> E) -> Result<&str, E>;
}

impl<T: Resource, E> RequireMetadata<E> for T {
    fn require_name_or(&self, error: E) -> Result<&str, E> {
        Ok(self.meta().name.as_ref().ok_or(error)?.as_str())
    }

    fn require_name_or_else(&self, error: impl FnOnce() -> E) -> Result<&str, E> {
        Ok(self.meta().name.as_ref().ok_or_else(error)?.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_name;

    #[test]
    fn normalize_name_lowercases_and_replaces_separators() {
        assert_eq!(normalize_name("My_Lab Topo"), "my-lab-topo");
        assert_eq!(normalize_name("srl1"), "srl1");
    }

    #[test]
    fn normalize_name_drops_invalid_characters() {
        assert_eq!(normalize_name("leaf#1@dc"), "leaf1dc");
        assert_eq!(normalize_name("a.b-c"), "a.b-c");
    }

    #[test]
    fn normalize_name_fixes_edges() {
        assert_eq!(normalize_name("-leaf-"), "leaf");
        assert_eq!(normalize_name("__"), "x");
        assert_eq!(normalize_name(""), "x");
        assert_eq!(normalize_name("..spine1"), "spine1");
    }
}
