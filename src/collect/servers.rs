//! Server items for `!{explode server(...)}` templates.

use crate::directory::{attrs, Directory};
use crate::error::Result;

/// The parts of a server an explode block can reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAttrItem {
    pub zimbra_id: String,
    pub hostname: String,
    pub services: Vec<String>,
}

impl ServerAttrItem {
    pub fn has_service(&self, service: &str) -> bool {
        self.services.iter().any(|s| s == service)
    }
}

/// One item per directory server, in directory order.
pub fn load_servers(directory: &dyn Directory) -> Result<Vec<ServerAttrItem>> {
    let items: Vec<ServerAttrItem> = directory
        .all_servers()?
        .into_iter()
        .map(|s| ServerAttrItem {
            zimbra_id: s.get_attr_or(attrs::ID, ""),
            hostname: s.get_attr_or(attrs::SERVICE_HOSTNAME, ""),
            services: s.get_multi_attr(attrs::SERVICE_ENABLED).to_vec(),
        })
        .collect();
    tracing::debug!(count = items.len(), "Loaded server attributes");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{Entry, SnapshotDirectory};

    #[test]
    fn test_load_servers() {
        let dir = SnapshotDirectory::new(
            Entry::new("config"),
            vec![
                Entry::new("mbs1")
                    .with_attr(attrs::ID, "id-1")
                    .with_attr(attrs::SERVICE_HOSTNAME, "mbs1")
                    .with_multi_attr(attrs::SERVICE_ENABLED, ["mailbox", "service"]),
                Entry::new("mta1").with_attr(attrs::SERVICE_HOSTNAME, "mta1"),
            ],
            vec![],
        );
        let items = load_servers(&dir).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].zimbra_id, "id-1");
        assert!(items[0].has_service("mailbox"));
        assert!(!items[1].has_service("mailbox"));
        assert_eq!(items[1].zimbra_id, "");
    }
}
