//! Event key micro-syntax
//!
//! Subscriber keys look like `Enlight_Bootstrap_InitResource_<ns>.<service>`.
//! The marker names the event family, the text up to the first separator
//! completes the event identifier and the remainder names the service.

use serde::{Deserialize, Serialize};

pub const INIT_RESOURCE_MARKER: &str = "Enlight_Bootstrap_InitResource_";
pub const AFTER_INIT_RESOURCE_MARKER: &str = "Enlight_Bootstrap_AfterInitResource_";
pub const DEFAULT_SEPARATOR: char = '.';

/// A key split into the event it subscribes to and the service it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedEventKey {
    pub target_event: String,
    pub service_name: String,
}

/// Marker and separator rules for recognising subscriber keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyConvention {
    pub markers: Vec<String>,
    pub separator: char,
}

impl Default for KeyConvention {
    fn default() -> Self {
        Self {
            markers: vec![
                INIT_RESOURCE_MARKER.to_string(),
                AFTER_INIT_RESOURCE_MARKER.to_string(),
            ],
            separator: DEFAULT_SEPARATOR,
        }
    }
}

impl KeyConvention {
    pub fn new(markers: Vec<String>, separator: char) -> Self {
        Self { markers, separator }
    }

    /// Split a raw key, or `None` when it does not follow the convention.
    pub fn parse(&self, raw: &str) -> Option<ParsedEventKey> {
        let marker = self
            .markers
            .iter()
            .filter(|m| !m.is_empty() && raw.starts_with(m.as_str()))
            .max_by_key(|m| m.len())?;

        let rest = &raw[marker.len()..];
        if rest.trim().is_empty() {
            return None;
        }

        match rest.split_once(self.separator) {
            Some((namespace, service)) => {
                let service = service.trim();
                if namespace.trim().is_empty() || service.is_empty() {
                    return None;
                }
                Some(ParsedEventKey {
                    target_event: format!("{}{}", marker, namespace),
                    service_name: service.to_string(),
                })
            }
            None => Some(ParsedEventKey {
                target_event: raw.to_string(),
                service_name: rest.trim().to_string(),
            }),
        }
    }
}

/// Parse with the default Shopware convention.
pub fn parse_event_key(raw: &str) -> Option<ParsedEventKey> {
    KeyConvention::default().parse(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_namespaced_service() {
        let parsed = parse_event_key("Enlight_Bootstrap_InitResource_swagcoupons.basket_helper").unwrap();
        assert_eq!(parsed.target_event, "Enlight_Bootstrap_InitResource_swagcoupons");
        assert_eq!(parsed.service_name, "basket_helper");
    }

    #[test]
    fn test_parse_recovers_embedded_service() {
        for service in ["settings", "basket_helper", "a", "shop.nested.name"] {
            let raw = format!("{}plugin.{}", INIT_RESOURCE_MARKER, service);
            let parsed = parse_event_key(&raw).unwrap();
            assert_eq!(parsed.service_name, service);
            assert_eq!(parsed.target_event, format!("{}plugin", INIT_RESOURCE_MARKER));
        }
    }

    #[test]
    fn test_parse_without_separator_keeps_whole_key() {
        let parsed = parse_event_key("Enlight_Bootstrap_InitResource_router").unwrap();
        assert_eq!(parsed.target_event, "Enlight_Bootstrap_InitResource_router");
        assert_eq!(parsed.service_name, "router");
    }

    #[test]
    fn test_parse_after_init_marker() {
        let parsed = parse_event_key("Enlight_Bootstrap_AfterInitResource_shop.template").unwrap();
        assert_eq!(parsed.target_event, "Enlight_Bootstrap_AfterInitResource_shop");
        assert_eq!(parsed.service_name, "template");
    }

    #[test]
    fn test_parse_rejects_unrelated_keys() {
        assert_eq!(parse_event_key(""), None);
        assert_eq!(parse_event_key("Enlight_Controller_Action_PostDispatch_Frontend"), None);
        assert_eq!(parse_event_key("Theme_Compiler_Collect_Plugin_Less"), None);
        // marker must lead the key
        assert_eq!(parse_event_key("x_Enlight_Bootstrap_InitResource_a.b"), None);
    }

    #[test]
    fn test_parse_degenerate_keys() {
        assert_eq!(parse_event_key(INIT_RESOURCE_MARKER), None);
        assert_eq!(parse_event_key("Enlight_Bootstrap_InitResource_   "), None);
        assert_eq!(parse_event_key("Enlight_Bootstrap_InitResource_.service"), None);
        assert_eq!(parse_event_key("Enlight_Bootstrap_InitResource_plugin."), None);
        assert_eq!(parse_event_key("Enlight_Bootstrap_InitResource_plugin.  "), None);
    }

    #[test]
    fn test_custom_convention() {
        let convention = KeyConvention::new(vec!["Bus_Init_".to_string()], ':');
        let parsed = convention.parse("Bus_Init_mailer:transport").unwrap();
        assert_eq!(parsed.target_event, "Bus_Init_mailer");
        assert_eq!(parsed.service_name, "transport");

        assert_eq!(convention.parse("Enlight_Bootstrap_InitResource_a.b"), None);
    }

    #[test]
    fn test_empty_marker_never_matches() {
        let convention = KeyConvention::new(vec![String::new()], '.');
        assert_eq!(convention.parse("anything.at_all"), None);
    }
}
