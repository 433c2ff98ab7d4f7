use once_cell::sync::Lazy;
use regex::Regex;

use super::{KindProfile, NodeUserProfile};

static EDA_STYLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^ethernet-(\d+)-(\d+)$").unwrap());
static BREAKOUT_STYLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z]+(\d+)_(\d+)$").unwrap());
static SHORT_STYLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(?:eth|et)(\d+)$").unwrap());
static TOKEN_BREAKOUT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(?:eth|et)\d+_\d+$").unwrap());
static TOKEN_SHORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(eth|et)(\d+)$").unwrap());

const SCHEMA_PROFILES: &[(&str, &str)] = &[(
    "4.33.2f",
    "https://github.com/hellt/tmp/releases/download/v0.0.1-test1/eos-4.33.2f.zip",
)];

/// Arista cEOS (`arista_ceos`).
pub struct Ceos;

impl KindProfile for Ceos {
    fn clab_kind(&self) -> &'static str {
        "arista_ceos"
    }

    fn operating_system(&self) -> &'static str {
        "eos"
    }

    fn default_node_type(&self) -> &'static str {
        "ceos"
    }

    fn platform(&self, _node_type: &str) -> String {
        "EOS".to_owned()
    }

    fn containerlab_label(&self) -> &'static str {
        "managedEos"
    }

    fn node_user(&self) -> NodeUserProfile {
        NodeUserProfile {
            name: "admin-ceos",
            username: "admin",
            password: "admin",
        }
    }

    fn gnmi_port(&self) -> u16 {
        50051
    }

    fn profile_token(&self) -> &'static str {
        "ceos"
    }

    fn schema_file_name(&self, version: &str) -> String {
        format!("eos-{version}.zip")
    }

    fn artifact_name(&self, version: &str) -> String {
        format!("clab-eos-{version}")
    }

    fn artifact_url(&self, version: &str) -> Option<&'static str> {
        SCHEMA_PROFILES
            .iter()
            .find(|(known, _)| *known == version)
            .map(|(_, url)| *url)
    }

    fn interface_name(&self, ifname: &str) -> String {
        if let Some(caps) = EDA_STYLE
            .captures(ifname)
            .or_else(|| BREAKOUT_STYLE.captures(ifname))
        {
            return format!("ethernet-{}-{}", &caps[1], &caps[2]);
        }

        if let Some(caps) = SHORT_STYLE.captures(ifname) {
            return format!("ethernet-{}-1", &caps[1]);
        }

        ifname.to_owned()
    }

    fn management_address(&self, ipv4: &str, prefix_length: Option<u8>) -> String {
        match prefix_length {
            Some(prefix_length) => format!("{ipv4}/{prefix_length}"),
            None => ipv4.to_owned(),
        }
    }

    /// `eth1` and `eth1_1` must produce the same TopoLink name.
    fn link_token(&self, ifname: &str) -> String {
        if TOKEN_BREAKOUT.is_match(ifname) {
            return ifname.to_owned();
        }

        if let Some(caps) = TOKEN_SHORT.captures(ifname) {
            return format!("{}{}_1", &caps[1], &caps[2]);
        }

        if let Some(caps) = EDA_STYLE.captures(ifname) {
            return format!("eth{}_{}", &caps[1], &caps[2]);
        }

        ifname.to_owned()
    }
}
