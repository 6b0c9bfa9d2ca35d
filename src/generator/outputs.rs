//! The fixed list of (template, output) pairs a run expands.

use std::path::PathBuf;

use super::options::Paths;

/// Include outputs, in expansion order, after the core file.
const INCLUDE_NAMES: &[&str] = &[
    "main",
    "memcache",
    "zmlookup",
    "mail",
    "mail.imap",
    "mail.imap.default",
    "mail.imaps",
    "mail.imaps.default",
    "mail.pop3",
    "mail.pop3.default",
    "mail.pop3s",
    "mail.pop3s.default",
    "web",
    "web.http",
    "web.http.default",
    "web.https",
    "web.https.default",
    "web.sso",
    "web.sso.default",
    "web.admin",
    "web.admin.default",
];

/// Values of `zimbraReverseProxyMailMode` with a dedicated include.
const WEB_MODES: &[&str] = &["http", "https", "both", "redirect", "mixed"];

/// Server-exploded document service includes.
const DOCS_NAMES: &[&str] = &["docs.common", "docs.upstream"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateOutput {
    pub template: PathBuf,
    pub output: PathBuf,
}

/// Every pair in order; the core file comes first.
pub fn template_outputs(paths: &Paths) -> Vec<TemplateOutput> {
    let mut names: Vec<String> = INCLUDE_NAMES.iter().map(|n| n.to_string()).collect();
    for scheme in ["http", "https"] {
        names.extend(WEB_MODES.iter().map(|mode| format!("web.{scheme}.mode-{mode}")));
    }
    names.extend(DOCS_NAMES.iter().map(|n| n.to_string()));

    let mut outputs = vec![TemplateOutput {
        template: paths.core_template(),
        output: paths.core_output(),
    }];
    outputs.extend(names.iter().map(|name| TemplateOutput {
        template: paths.template_path(name),
        output: paths.output_path(name),
    }));
    outputs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_first_then_includes() {
        let outputs = template_outputs(&Paths::new("/opt/zimbra"));
        assert_eq!(outputs.len(), 1 + INCLUDE_NAMES.len() + 10 + DOCS_NAMES.len());
        assert_eq!(outputs[0].output, PathBuf::from("/opt/zimbra/conf/nginx.conf"));
        assert_eq!(
            outputs[1].template,
            PathBuf::from("/opt/zimbra/conf/nginx/templates/nginx.conf.main.template")
        );
        assert!(outputs.iter().any(|o| o.output
            == PathBuf::from("/opt/zimbra/conf/nginx/includes/nginx.conf.web.https.mode-redirect")));
        assert_eq!(
            outputs.last().map(|o| o.output.clone()),
            Some(PathBuf::from("/opt/zimbra/conf/nginx/includes/nginx.conf.docs.upstream"))
        );
    }
}
