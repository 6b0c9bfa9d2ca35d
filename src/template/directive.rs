//! First-line `!{...}` commands that turn a template into an explosion.

use crate::collect::DomainAttrItem;
use crate::error::{ProxyConfError, Result};

const LEGACY_VHN_VIP_SSL: &str = "!{explode vhn_vip_ssl}";

/// Condition a domain item must meet to get a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainPredicate {
    /// Non-empty virtual hostname.
    Vhn,
    /// Client certificate mode set and not `off`.
    Sso,
}

impl DomainPredicate {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "vhn" => Some(DomainPredicate::Vhn),
            "sso" => Some(DomainPredicate::Sso),
            _ => None,
        }
    }

    pub fn accepts(&self, item: &DomainAttrItem) -> bool {
        match self {
            DomainPredicate::Vhn => !item.virtual_hostname.is_empty(),
            DomainPredicate::Sso => item
                .client_cert_mode
                .as_deref()
                .is_some_and(|mode| !mode.is_empty() && mode != "off"),
        }
    }
}

/// How the rest of a template is expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// No command; every line, the first included, is substituted once.
    Plain,
    /// `!{explode vhn_vip_ssl}`: one block per domain item, no predicates.
    LegacyVhnVipSsl,
    /// `!{explode domain(...)}`
    Domain(Vec<DomainPredicate>),
    /// `!{explode server(tag)}`
    Server(String),
    /// `explode` with an argument other than `server(...)`/`domain(...)`.
    /// Only an error when per-vhost generation is on.
    UnknownExplode(String),
}

/// Interpret the first template line.
pub fn parse_directive(line: &str) -> Result<Directive> {
    if line.eq_ignore_ascii_case(LEGACY_VHN_VIP_SSL) {
        return Ok(Directive::LegacyVhnVipSsl);
    }
    let Some(command) = find_command(line) else {
        return Ok(Directive::Plain);
    };

    let mut parts = command.splitn(2, [' ', '\t']);
    let verb = parts.next().unwrap_or_default();
    let arg = parts
        .next()
        .map(|rest| rest.trim_start_matches([' ', '\t']))
        .unwrap_or_default();
    if verb != "explode" || arg.is_empty() {
        return Err(ProxyConfError::IllegalCommand(command.to_string()));
    }

    if let Some(tag) = call_args(arg, "server") {
        if tag.is_empty() {
            return Err(ProxyConfError::MissingServiceParameter(command.to_string()));
        }
        return Ok(Directive::Server(tag.to_string()));
    }
    if let Some(args) = call_args(arg, "domain") {
        return Ok(Directive::Domain(parse_predicates(args)));
    }
    Ok(Directive::UnknownExplode(command.to_string()))
}

/// Body of the right-most `!{...}` on the line.
fn find_command(line: &str) -> Option<&str> {
    let mut search_end = line.len();
    while let Some(start) = line[..search_end].rfind("!{") {
        if let Some(close) = line[start + 2..].find('}') {
            if close > 0 {
                return Some(&line[start + 2..start + 2 + close]);
            }
        }
        search_end = start;
    }
    None
}

/// `name(args)` → `args`
fn call_args<'a>(arg: &'a str, name: &str) -> Option<&'a str> {
    arg.strip_prefix(name)?.strip_prefix('(')?.strip_suffix(')')
}

fn parse_predicates(args: &str) -> Vec<DomainPredicate> {
    if args.is_empty() {
        return Vec::new();
    }
    args.split(',')
        .map(|name| name.trim_start_matches([' ', '\t']))
        .filter_map(|name| {
            let predicate = DomainPredicate::parse(name);
            if predicate.is_none() {
                tracing::warn!(predicate = %name, "Ignoring unknown explode domain predicate");
            }
            predicate
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_lines() {
        assert_eq!(parse_directive("server {").unwrap(), Directive::Plain);
        assert_eq!(parse_directive("# !{} empty").unwrap(), Directive::Plain);
        assert_eq!(parse_directive("").unwrap(), Directive::Plain);
    }

    #[test]
    fn test_legacy_is_case_insensitive() {
        assert_eq!(
            parse_directive("!{EXPLODE VHN_VIP_SSL}").unwrap(),
            Directive::LegacyVhnVipSsl
        );
    }

    #[test]
    fn test_domain_predicates() {
        assert_eq!(
            parse_directive("!{explode domain(vhn, sso)}").unwrap(),
            Directive::Domain(vec![DomainPredicate::Vhn, DomainPredicate::Sso])
        );
        assert_eq!(parse_directive("!{explode domain()}").unwrap(), Directive::Domain(vec![]));
        assert_eq!(
            parse_directive("# comment !{explode domain(vhn,\tbogus)}").unwrap(),
            Directive::Domain(vec![DomainPredicate::Vhn])
        );
    }

    #[test]
    fn test_server_tag() {
        assert_eq!(
            parse_directive("!{explode server(docs)}").unwrap(),
            Directive::Server("docs".to_string())
        );
        assert!(matches!(
            parse_directive("!{explode server()}"),
            Err(ProxyConfError::MissingServiceParameter(cmd)) if cmd == "explode server()"
        ));
    }

    #[test]
    fn test_illegal_commands() {
        assert!(matches!(
            parse_directive("!{implode domain(vhn)}"),
            Err(ProxyConfError::IllegalCommand(_))
        ));
        assert!(matches!(parse_directive("!{explode}"), Err(ProxyConfError::IllegalCommand(_))));
        assert_eq!(
            parse_directive("!{explode mailbox(x)}").unwrap(),
            Directive::UnknownExplode("explode mailbox(x)".to_string())
        );
    }

    #[test]
    fn test_predicates_against_items() {
        let mut item = DomainAttrItem {
            domain_name: "example.com".to_string(),
            virtual_hostname: "mail.example.com".to_string(),
            virtual_ip: None,
            resolved_ip: None,
            ssl_certificate: None,
            ssl_private_key: None,
            client_cert_mode: Some("off".to_string()),
            client_cert_ca: None,
            response_headers: vec![],
        };
        assert!(DomainPredicate::Vhn.accepts(&item));
        assert!(!DomainPredicate::Sso.accepts(&item));

        item.client_cert_mode = Some("optional".to_string());
        assert!(DomainPredicate::Sso.accepts(&item));

        item.virtual_hostname.clear();
        assert!(!DomainPredicate::Vhn.accepts(&item));
    }
}
