use std::fmt::Display;

use serde::Serialize;

use crate::cli::OutputFormat;

const COLUMN_SEPARATOR: &str = "   ";

#[derive(Serialize)]
pub struct TableCellOption<T>(Option<T>);

impl<T> From<Option<T>> for TableCellOption<T> {
    fn from(value: Option<T>) -> Self {
        TableCellOption(value)
    }
}

impl<T: Display> Display for TableCellOption<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(value) = &self.0 {
            value.fmt(f)
        } else {
            f.write_str("-")
        }
    }
}

pub trait TableOutputRow {
    fn get_name(&self) -> String;
    fn get_column_names() -> Vec<String>;
    fn get_column_count() -> usize;
    fn get_row(&self) -> Vec<String>;
}

/// Left-aligned columns padded to the widest cell.
pub fn render_table<T: TableOutputRow>(rows: &[T], with_headers: bool) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);

    if with_headers {
        lines.push(T::get_column_names());
    }

    lines.extend(rows.iter().map(|row| row.get_row()));

    let mut widths = vec![0; T::get_column_count()];
    for line in &lines {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    lines
        .iter()
        .map(|line| {
            line.iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join(COLUMN_SEPARATOR)
                .trim_end()
                .to_owned()
        })
        .map(|line| line + "\n")
        .collect()
}

pub trait TableOutputDisplay {
    fn print_names(&self);
    fn print_table(&self);
    fn print_table_with_headers(&self);
}

impl<T: TableOutputRow> TableOutputDisplay for [T] {
    fn print_names(&self) {
        for row in self {
            println!("{}", row.get_name());
        }
    }

    fn print_table(&self) {
        print!("{}", render_table(self, false));
    }

    fn print_table_with_headers(&self) {
        print!("{}", render_table(self, true));
    }
}

pub trait SerializableOutputDisplay {
    fn print_json(&self) -> Result<(), serde_json::Error>;
    fn print_json_pretty(&self) -> Result<(), serde_json::Error>;
    fn print_yaml(&self) -> Result<(), serde_yaml::Error>;
}

impl<T: ?Sized + Serialize> SerializableOutputDisplay for T {
    fn print_json(&self) -> Result<(), serde_json::Error> {
        let output = serde_json::to_string(self)?;
        println!("{output}");

        Ok(())
    }

    fn print_json_pretty(&self) -> Result<(), serde_json::Error> {
        let output = serde_json::to_string_pretty(self)?;
        println!("{output}");

        Ok(())
    }

    fn print_yaml(&self) -> Result<(), serde_yaml::Error> {
        let output = serde_yaml::to_string(self)?;
        print!("{output}");

        Ok(())
    }
}

pub trait CliPrint {
    fn print(&self, format: OutputFormat) -> anyhow::Result<()>;
}

impl<T: TableOutputRow + Serialize> CliPrint for [T] {
    fn print(&self, format: OutputFormat) -> anyhow::Result<()> {
        match format {
            OutputFormat::Names => self.print_names(),
            OutputFormat::Table => self.print_table(),
            OutputFormat::TableWithHeaders => self.print_table_with_headers(),
            OutputFormat::Json => self.print_json()?,
            OutputFormat::JsonPretty => self.print_json_pretty()?,
            OutputFormat::Yaml => self.print_yaml()?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clab_connector_macros::TableOutputRow;

    use super::*;

    #[derive(Serialize, TableOutputRow)]
    struct Row {
        #[name_column]
        name: &'static str,
        #[table(header = "STATE")]
        node_state: TableCellOption<&'static str>,
    }

    #[test]
    fn table_columns_are_aligned() {
        let rows = [
            Row {
                name: "leaf1",
                node_state: Some("Synced").into(),
            },
            Row {
                name: "spine-long-name",
                node_state: None.into(),
            },
        ];

        assert_eq!(
            render_table(&rows, true),
            "NAME              STATE\n\
             leaf1             Synced\n\
             spine-long-name   -\n"
        );
        assert_eq!(rows[1].get_name(), "spine-long-name");
    }

    #[test]
    fn headers_default_to_uppercased_field_names() {
        #[derive(Serialize, TableOutputRow)]
        struct Other {
            #[name_column]
            node_name: String,
        }

        assert_eq!(Other::get_column_names(), vec!["NODE NAME".to_owned()]);
    }
}
