use once_cell::sync::Lazy;
use regex::Regex;

use super::{mda_letter, Component, KindProfile, NodeUserProfile};

static SLOT_MDA_PORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)/(\d+)/(\d+)$").unwrap());
static BREAKOUT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)/(\d+)/c(\d+)/(\d+)$").unwrap());
static XIOM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)/x(\d+)/(\d+)/(\d+)$").unwrap());
static ETH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^eth(\d+)$").unwrap());
static CLAB_INTERFACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^e(\d+)-(\d+)$").unwrap());
static LOOPBACK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^lo(\d+)$").unwrap());

const SCHEMA_PROFILES: &[(&str, &str)] = &[(
    "25.3.r2",
    "https://github.com/nokia-eda/schema-profiles/releases/download/nokia-sros-v25.3.r2/sros-25.3.r2.zip",
)];

struct Chassis {
    node_type: &'static str,
    line_card: &'static str,
    mda: &'static str,
    connectors: usize,
}

const CHASSIS: &[Chassis] = &[
    Chassis {
        node_type: "sr-1",
        line_card: "iom-1",
        mda: "me12-100gb-qsfp28",
        connectors: 12,
    },
    Chassis {
        node_type: "sr-1s",
        line_card: "xcm-1s",
        mda: "s36-100gb-qsfp28",
        connectors: 36,
    },
    Chassis {
        node_type: "sr-2s",
        line_card: "xcm-2s",
        mda: "ms8-100gb-sfpdd+2-100gb-qsfp28",
        connectors: 10,
    },
    Chassis {
        node_type: "sr-7s",
        line_card: "xcm-7s",
        mda: "s36-100gb-qsfp28",
        connectors: 36,
    },
];

const CONNECTOR_TYPE: &str = "c1-100g";

/// Nokia SR OS (`nokia_sros`).
pub struct Sros;

impl KindProfile for Sros {
    fn clab_kind(&self) -> &'static str {
        "nokia_sros"
    }

    fn operating_system(&self) -> &'static str {
        "sros"
    }

    fn default_node_type(&self) -> &'static str {
        "sr7750"
    }

    fn platform(&self, node_type: &str) -> String {
        if node_type.to_lowercase().starts_with("sr-") {
            format!("7750 {}", node_type.to_uppercase())
        } else {
            "7750 SR".to_owned()
        }
    }

    fn containerlab_label(&self) -> &'static str {
        "managedSros"
    }

    fn node_user(&self) -> NodeUserProfile {
        NodeUserProfile {
            name: "admin-sros",
            username: "admin",
            password: "NokiaSros1!",
        }
    }

    fn gnmi_port(&self) -> u16 {
        57400
    }

    fn profile_token(&self) -> &'static str {
        "sros"
    }

    fn schema_file_name(&self, version: &str) -> String {
        format!("sros-{version}.zip")
    }

    fn artifact_name(&self, version: &str) -> String {
        format!("clab-sros-ghcr-{version}")
    }

    fn artifact_url(&self, version: &str) -> Option<&'static str> {
        SCHEMA_PROFILES
            .iter()
            .find(|(known, _)| *known == version)
            .map(|(_, url)| *url)
    }

    fn interface_name(&self, ifname: &str) -> String {
        if let Some(caps) = SLOT_MDA_PORT.captures(ifname) {
            return format!(
                "ethernet-{}-{}-{}-1",
                &caps[1],
                mda_letter(&caps[2]),
                &caps[3]
            );
        }

        if let Some(caps) = BREAKOUT.captures(ifname) {
            // MDA 1 is implicit in the EDA name
            return if &caps[2] == "1" {
                format!("ethernet-{}-{}-{}", &caps[1], &caps[3], &caps[4])
            } else {
                format!(
                    "ethernet-{}-{}-{}-{}",
                    &caps[1],
                    mda_letter(&caps[2]),
                    &caps[3],
                    &caps[4]
                )
            };
        }

        if let Some(caps) = XIOM.captures(ifname) {
            return format!(
                "ethernet-{}-{}-{}-{}",
                &caps[1],
                &caps[2],
                mda_letter(&caps[3]),
                &caps[4]
            );
        }

        if let Some(caps) = ETH.captures(ifname) {
            return format!("ethernet-1-a-{}-1", &caps[1]);
        }

        if let Some(caps) = CLAB_INTERFACE.captures(ifname) {
            return format!("ethernet-{}-a-{}-1", &caps[1], &caps[2]);
        }

        if let Some(caps) = LOOPBACK.captures(ifname) {
            return format!("loopback-{}", &caps[1]);
        }

        ifname.to_owned()
    }

    fn role(&self, _node_name: &str) -> &'static str {
        "dcgw"
    }

    fn interface_resource_name(&self, node_name: &str, ifname: &str) -> String {
        let eda_name = self.interface_name(ifname);
        let resource = eda_name.strip_prefix("ethernet-").unwrap_or(&eda_name);

        format!("{node_name}-{resource}")
    }

    fn license(&self, version: &str) -> Option<String> {
        Some(format!("sros-ghcr-{version}-dummy-license"))
    }

    fn llm_db(&self, version: &str) -> Option<String> {
        Some(format!(
            "https://eda-asvr.eda-system.svc/eda-system/llm-dbs/llm-db-sros-ghcr-{version}/llm-embeddings-sros-{}.tar.gz",
            version.replace('.', "-")
        ))
    }

    fn components(&self, node_type: &str) -> Vec<Component> {
        let node_type = node_type.to_lowercase();
        let Some(chassis) = CHASSIS.iter().find(|c| c.node_type == node_type) else {
            return Vec::new();
        };

        let mut components = vec![
            Component {
                kind: "lineCard",
                slot: "1".to_owned(),
                type_: chassis.line_card,
            },
            Component {
                kind: "mda",
                slot: "1-a".to_owned(),
                type_: chassis.mda,
            },
        ];

        components.extend((1..=chassis.connectors).map(|i| Component {
            kind: "connector",
            slot: format!("1-a-{i}"),
            type_: CONNECTOR_TYPE,
        }));

        components
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_port_names_are_mapped() {
        assert_eq!(Sros.interface_name("1/1/1"), "ethernet-1-a-1-1");
        assert_eq!(Sros.interface_name("2/2/1"), "ethernet-2-b-1-1");
        assert_eq!(Sros.interface_name("1/1/c1/1"), "ethernet-1-1-1");
        assert_eq!(Sros.interface_name("1/2/c2/1"), "ethernet-1-b-2-1");
        assert_eq!(Sros.interface_name("1/x1/1/1"), "ethernet-1-1-a-1");
    }

    #[test]
    fn clab_port_names_are_mapped() {
        assert_eq!(Sros.interface_name("eth3"), "ethernet-1-a-3-1");
        assert_eq!(Sros.interface_name("e1-2"), "ethernet-1-a-2-1");
        assert_eq!(Sros.interface_name("lo0"), "loopback-0");
        assert_eq!(Sros.interface_name("lag-10"), "lag-10");
        assert_eq!(Sros.interface_name("system"), "system");
    }

    #[test]
    fn interface_resource_drops_ethernet_prefix() {
        assert_eq!(Sros.interface_resource_name("pe1", "1/1/1"), "pe1-1-a-1-1");
        assert_eq!(Sros.interface_resource_name("pe1", "lo0"), "pe1-loopback-0");
    }

    #[test]
    fn platform_depends_on_chassis_type() {
        assert_eq!(Sros.platform("sr-1"), "7750 SR-1");
        assert_eq!(Sros.platform("SR-7s"), "7750 SR-7S");
        assert_eq!(Sros.platform("sr7750"), "7750 SR");
    }

    #[test]
    fn components_follow_chassis() {
        let components = Sros.components("SR-1");

        assert_eq!(components.len(), 14);
        assert_eq!(components[0].type_, "iom-1");
        assert_eq!(components[1].slot, "1-a");
        assert_eq!(components[13].slot, "1-a-12");
        assert!(Sros.components("sr7750").is_empty());
    }

    #[test]
    fn llm_db_uses_dashed_version() {
        assert_eq!(
            Sros.llm_db("25.3.r2").as_deref(),
            Some("https://eda-asvr.eda-system.svc/eda-system/llm-dbs/llm-db-sros-ghcr-25.3.r2/llm-embeddings-sros-25-3-r2.tar.gz")
        );
    }
}
