//! Template expansion into a buffered output.
//!
//! # Data Flow
//! ```text
//! template text
//!     → first line → directive.rs
//!     → Plain:    fill every line once
//!     → Domain:   first qualifying item captures the rest of the template,
//!                 later items replay the TemplateLineCache
//!     → Server:   cache body, replay per server carrying the tag
//!     → buffer written to the output file only when the whole template succeeded
//! ```

use std::fs;
use std::path::Path;

use crate::collect::domains::{apply_domain_vars, DomainVarContext, DOMAIN_SCOPED_KEYS};
use crate::collect::{DomainCollection, ServerAttrItem};
use crate::error::{ProxyConfError, Result};
use crate::vars::VarMap;

use super::directive::{parse_directive, Directive, DomainPredicate};
use super::fill::fill_line;

/// Non-comment template lines kept for replay.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TemplateLineCache {
    lines: Vec<String>,
}

impl TemplateLineCache {
    /// Substitute and write every line, keeping the non-comment ones.
    pub fn capture(lines: &[&str], vars: &VarMap, out: &mut String) -> Self {
        let mut cache = Self::default();
        for line in lines {
            if !line.starts_with('#') {
                cache.lines.push(line.to_string());
            }
            push_line(out, &fill_line(line, vars));
        }
        cache
    }

    /// Cache the non-comment lines without writing anything.
    pub fn body(lines: &[&str]) -> Self {
        Self {
            lines: lines
                .iter()
                .filter(|line| !line.starts_with('#'))
                .map(|line| line.to_string())
                .collect(),
        }
    }

    pub fn replay(&self, vars: &VarMap, out: &mut String) {
        for line in &self.lines {
            push_line(out, &fill_line(line, vars));
        }
    }
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

/// Expands templates against the resolved variables of one run.
pub struct TemplateExpander<'a> {
    pub domains: &'a DomainCollection,
    pub servers: &'a [ServerAttrItem],
    /// `zimbraReverseProxyGenConfigPerVirtualHostname` on the effective server.
    pub per_vhost: bool,
    pub domain_ctx: &'a DomainVarContext,
    pub dry_run: bool,
}

impl TemplateExpander<'_> {
    /// Expand `template` into `output`. Nothing is written on failure.
    pub fn expand(&self, template: &Path, output: &Path, vars: &mut VarMap) -> Result<()> {
        if self.dry_run {
            tracing::info!(
                template = %template.display(),
                output = %output.display(),
                "Would expand template"
            );
            return Ok(());
        }

        tracing::info!(
            template = %template.display(),
            output = %output.display(),
            "Expanding template"
        );
        let text = fs::read_to_string(template).map_err(|source| ProxyConfError::Template {
            path: template.to_path_buf(),
            source,
        })?;
        let expanded = self.expand_text(&text, vars)?;
        fs::write(output, expanded).map_err(|source| ProxyConfError::Write {
            path: output.to_path_buf(),
            source,
        })
    }

    /// Expand template text in memory.
    pub fn expand_text(&self, text: &str, vars: &mut VarMap) -> Result<String> {
        let lines: Vec<&str> = text.lines().collect();
        let Some(first) = lines.first() else {
            return Ok(String::new());
        };

        let mut out = String::new();
        match parse_directive(first)? {
            Directive::Plain => {
                for line in &lines {
                    push_line(&mut out, &fill_line(line, vars));
                }
            }
            Directive::LegacyVhnVipSsl => {
                self.explode_domains(&lines[1..], &[], vars, &mut out)?;
            }
            Directive::Server(tag) => {
                self.explode_servers(&lines[1..], &tag, vars, &mut out);
            }
            Directive::Domain(predicates) => {
                if self.per_vhost {
                    self.explode_domains(&lines[1..], &predicates, vars, &mut out)?;
                } else {
                    tracing::debug!("Per virtual host generation disabled, skipping domain explosion");
                }
            }
            Directive::UnknownExplode(command) => {
                if self.per_vhost {
                    return Err(ProxyConfError::IllegalCommand(command));
                }
            }
        }
        Ok(out)
    }

    /// One block per qualifying domain item, each followed by an empty line.
    ///
    /// Domain-scoped variables are restored afterwards, even on failure.
    fn explode_domains(
        &self,
        body: &[&str],
        predicates: &[DomainPredicate],
        vars: &mut VarMap,
        out: &mut String,
    ) -> Result<()> {
        let saved: Vec<(&str, Option<String>)> = DOMAIN_SCOPED_KEYS
            .iter()
            .map(|key| (*key, vars.get(key).map(str::to_string)))
            .collect();

        let result = self.write_domain_blocks(body, predicates, vars, out);

        for (key, value) in saved {
            match value {
                Some(value) => vars.set(key, value),
                None => {
                    vars.remove(key);
                }
            }
        }
        result
    }

    fn write_domain_blocks(
        &self,
        body: &[&str],
        predicates: &[DomainPredicate],
        vars: &mut VarMap,
        out: &mut String,
    ) -> Result<()> {
        let mut cache: Option<TemplateLineCache> = None;
        for slot in &self.domains.slots {
            let item = slot.require()?;
            if !predicates.iter().all(|p| p.accepts(item)) {
                tracing::debug!(vhn = %item.virtual_hostname, "Domain item does not qualify, skipping");
                continue;
            }

            apply_domain_vars(item, self.domain_ctx, vars);
            if let Some(cache) = &cache {
                cache.replay(vars, out);
            } else {
                cache = Some(TemplateLineCache::capture(body, vars, out));
            }
            out.push('\n');
        }
        Ok(())
    }

    /// Replay the body for every server carrying `tag`.
    fn explode_servers(&self, body: &[&str], tag: &str, vars: &mut VarMap, out: &mut String) {
        let servers: Vec<&ServerAttrItem> =
            self.servers.iter().filter(|s| s.has_service(tag)).collect();
        if servers.is_empty() {
            tracing::debug!(service = %tag, "No servers for explode");
            return;
        }

        let cache = TemplateLineCache::body(body);
        for server in servers {
            vars.set("server_id", server.zimbra_id.as_str());
            vars.set("server_hostname", server.hostname.as_str());
            cache.replay(vars, out);
            vars.remove("server_id");
            vars.remove("server_hostname");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::{DomainAttrItem, DomainSlot};
    use std::path::PathBuf;

    fn item(domain: &str, vhn: &str, mode: Option<&str>) -> DomainSlot {
        DomainSlot::Item(DomainAttrItem {
            domain_name: domain.to_string(),
            virtual_hostname: vhn.to_string(),
            virtual_ip: None,
            resolved_ip: None,
            ssl_certificate: Some("cert".to_string()),
            ssl_private_key: Some("key".to_string()),
            client_cert_mode: mode.map(str::to_string),
            client_cert_ca: None,
            response_headers: vec![],
        })
    }

    fn collection(slots: Vec<DomainSlot>) -> DomainCollection {
        DomainCollection {
            slots,
            ..Default::default()
        }
    }

    fn ctx() -> DomainVarContext {
        DomainVarContext {
            sni: false,
            domain_ssl_dir: PathBuf::from("/opt/zimbra/conf/domaincerts"),
        }
    }

    fn base_vars() -> VarMap {
        let mut vars = VarMap::default();
        vars.set("web.https.port", "443");
        vars.set("ssl.crt.default", "/opt/zimbra/conf/nginx.crt");
        vars.set("ssl.key.default", "/opt/zimbra/conf/nginx.key");
        vars.set("ssl.clientcertca.default", "/opt/zimbra/conf/nginx.client.ca.crt");
        vars.set("ssl.clientcertmode.default", "off");
        vars.set("web.sso.certauth.default.enabled", "#");
        vars.set("vhn", "default");
        vars
    }

    fn expander<'a>(
        domains: &'a DomainCollection,
        servers: &'a [ServerAttrItem],
        ctx: &'a DomainVarContext,
    ) -> TemplateExpander<'a> {
        TemplateExpander {
            domains,
            servers,
            per_vhost: true,
            domain_ctx: ctx,
            dry_run: false,
        }
    }

    const DOMAIN_TEMPLATE: &str = "!{explode domain(vhn)}\n# server for ${vhn}\nserver_name ${vhn};\nssl_certificate ${ssl.crt};\n";

    #[test]
    fn test_plain_template() {
        let domains = DomainCollection::default();
        let ctx = ctx();
        let mut vars = base_vars();
        let out = expander(&domains, &[], &ctx)
            .expand_text("listen ${web.https.port};\n# ${vhn}\n", &mut vars)
            .unwrap();
        assert_eq!(out, "listen 443;\n# default\n");
    }

    #[test]
    fn test_domain_explosion_in_order() {
        let domains = collection(vec![
            item("a.com", "mail.a.com", None),
            item("b.com", "mail.b.com", None),
        ]);
        let ctx = ctx();
        let mut vars = base_vars();
        let out = expander(&domains, &[], &ctx)
            .expand_text(DOMAIN_TEMPLATE, &mut vars)
            .unwrap();

        assert_eq!(
            out,
            "# server for mail.a.com\n\
             server_name mail.a.com;\n\
             ssl_certificate /opt/zimbra/conf/domaincerts/a.com.crt;\n\
             \n\
             server_name mail.b.com;\n\
             ssl_certificate /opt/zimbra/conf/domaincerts/b.com.crt;\n\
             \n"
        );
        assert_eq!(vars.get("vhn"), Some("default"));
        assert!(!vars.contains("ssl.crt"));
    }

    #[test]
    fn test_predicates_filter_items() {
        let domains = collection(vec![
            item("a.com", "mail.a.com", Some("off")),
            item("b.com", "mail.b.com", Some("on")),
        ]);
        let ctx = ctx();
        let mut vars = base_vars();
        let out = expander(&domains, &[], &ctx)
            .expand_text("!{explode domain(vhn, sso)}\nserver_name ${vhn};\n", &mut vars)
            .unwrap();
        assert_eq!(out, "server_name mail.b.com;\n\n");
    }

    #[test]
    fn test_domain_explosion_needs_per_vhost() {
        let domains = collection(vec![item("a.com", "mail.a.com", None)]);
        let ctx = ctx();
        let mut vars = base_vars();
        let mut exp = expander(&domains, &[], &ctx);
        exp.per_vhost = false;
        assert_eq!(exp.expand_text(DOMAIN_TEMPLATE, &mut vars).unwrap(), "");
        assert_eq!(exp.expand_text("!{explode bogus(x)}\n", &mut vars).unwrap(), "");

        exp.per_vhost = true;
        assert!(matches!(
            exp.expand_text("!{explode bogus(x)}\n", &mut vars),
            Err(ProxyConfError::IllegalCommand(_))
        ));
    }

    #[test]
    fn test_failed_slot_aborts_and_restores() {
        let domains = collection(vec![
            item("a.com", "mail.a.com", None),
            DomainSlot::Failed {
                domain: "b.com".to_string(),
                reason: "unresolvable".to_string(),
            },
        ]);
        let ctx = ctx();
        let mut vars = base_vars();
        let err = expander(&domains, &[], &ctx)
            .expand_text(DOMAIN_TEMPLATE, &mut vars)
            .unwrap_err();
        assert!(matches!(err, ProxyConfError::DomainFailed { ref domain, .. } if domain == "b.com"));
        assert_eq!(vars.get("vhn"), Some("default"));
    }

    #[test]
    fn test_legacy_explodes_without_predicates() {
        let domains = collection(vec![item("a.com", "", None)]);
        let ctx = ctx();
        let mut vars = base_vars();
        let out = expander(&domains, &[], &ctx)
            .expand_text("!{explode vhn_vip_ssl}\nssl_certificate_key ${ssl.key};\n", &mut vars)
            .unwrap();
        assert_eq!(out, "ssl_certificate_key /opt/zimbra/conf/domaincerts/a.com.key;\n\n");
    }

    #[test]
    fn test_server_explosion() {
        let servers = vec![
            ServerAttrItem {
                zimbra_id: "id-1".to_string(),
                hostname: "docs1.example.com".to_string(),
                services: vec!["docs".to_string()],
            },
            ServerAttrItem {
                zimbra_id: "id-2".to_string(),
                hostname: "mbox.example.com".to_string(),
                services: vec!["mailbox".to_string()],
            },
        ];
        let domains = DomainCollection::default();
        let ctx = ctx();
        let mut vars = base_vars();
        let out = expander(&domains, &servers, &ctx)
            .expand_text(
                "!{explode server(docs)}\n# upstream per docs server\nserver ${server_hostname}; # ${server_id}\n",
                &mut vars,
            )
            .unwrap();
        assert_eq!(out, "server docs1.example.com; # id-1\n");
        assert!(!vars.contains("server_id"));
    }

    #[test]
    fn test_expand_writes_only_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("t.template");
        let output = dir.path().join("out.conf");
        let domains = collection(vec![DomainSlot::Failed {
            domain: "b.com".to_string(),
            reason: "bad".to_string(),
        }]);
        let ctx = ctx();
        let mut vars = base_vars();
        let exp = expander(&domains, &[], &ctx);

        assert!(matches!(
            exp.expand(&template, &output, &mut vars),
            Err(ProxyConfError::Template { .. })
        ));

        fs::write(&template, DOMAIN_TEMPLATE).unwrap();
        assert!(exp.expand(&template, &output, &mut vars).is_err());
        assert!(!output.exists());

        fs::write(&template, "port ${web.https.port}\n").unwrap();
        exp.expand(&template, &output, &mut vars).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "port 443\n");
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.conf");
        let domains = DomainCollection::default();
        let ctx = ctx();
        let mut vars = base_vars();
        let mut exp = expander(&domains, &[], &ctx);
        exp.dry_run = true;
        exp.expand(&dir.path().join("missing.template"), &output, &mut vars)
            .unwrap();
        assert!(!output.exists());
    }
}
