//! One generation run, start to finish.
//!
//! # Responsibilities
//! - Build the registry and pick the effective server
//! - Collect domains and servers, resolve every variable, apply overrides
//! - Write the aggregate client CA bundle
//! - Expand every template and mark the core output with the result
//!
//! # Design Decisions
//! - All directory and DNS reads finish before the first output is written
//! - The first fatal error stops the run; earlier outputs stay on disk
//! - An unworkable configuration is a warning, never a failure

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::collect::domains::DomainVarContext;
use crate::collect::{load_servers, DomainCollection, DomainCollector};
use crate::directory::{attrs, Directory, Entry, HostResolver, IpMode, LocalConfig, ServerBy};
use crate::error::{ProxyConfError, Result};
use crate::template::TemplateExpander;
use crate::vars::{build_default_vars, custom, Sources, Value, VarRegistry};

use super::options::{GenerateOptions, RunMode};
use super::outputs::template_outputs;
use super::status::{append_status, RunStatus};

/// How a run that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every output was written.
    Generated,
    /// Everything was resolved; nothing was written.
    DryRun,
    /// Descriptors were printed instead of generating.
    Displayed,
}

/// Request-scoped generation context.
pub struct Generator<'a> {
    directory: &'a dyn Directory,
    resolver: &'a dyn HostResolver,
    local: &'a LocalConfig,
    options: &'a GenerateOptions,
}

impl<'a> Generator<'a> {
    pub fn new(
        directory: &'a dyn Directory,
        resolver: &'a dyn HostResolver,
        local: &'a LocalConfig,
        options: &'a GenerateOptions,
    ) -> Self {
        Self {
            directory,
            resolver,
            local,
            options,
        }
    }

    /// Run and record the result in the core output. Returns the exit code.
    pub fn execute(&self, out: &mut dyn Write) -> i32 {
        conclude(self.options, self.run(out))
    }

    /// Run every phase. Display modes write descriptors to `out`.
    pub fn run(&self, out: &mut dyn Write) -> Result<Outcome> {
        let options = self.options;
        let paths = &options.paths;

        tracing::debug!(
            work_dir = %paths.work_dir.display(),
            template_dir = %paths.template_dir.display(),
            includes_dir = %paths.includes_dir().display(),
            conf_prefix = %paths.conf_prefix,
            template_prefix = %paths.template_prefix,
            "Building default variable map"
        );
        let mut registry = build_default_vars(paths, &options.build);
        if options.mode == RunMode::DisplayDefaults {
            write_defaults(&registry, out)?;
            return Ok(Outcome::Displayed);
        }

        let config = self.directory.global_config()?;
        let server = self.effective_server()?;
        let per_vhost = server.get_bool_attr(attrs::GEN_CONFIG_PER_VHN, false);
        let ip_mode = IpMode::from_attr(server.get_attr(attrs::IP_MODE));
        let domain_ctx = DomainVarContext {
            sni: server.get_bool_attr(attrs::SNI_ENABLED, false),
            domain_ssl_dir: paths.domain_ssl_dir(),
        };

        let domains = DomainCollector {
            directory: self.directory,
            resolver: self.resolver,
            ip_mode,
            enforce_dns: options.enforce_dns,
            domain_ssl_dir: &domain_ctx.domain_ssl_dir,
        }
        .collect(per_vhost)?;
        let servers = load_servers(self.directory)?;

        let sources = Sources {
            directory: self.directory,
            config: &config,
            server: &server,
            local: self.local,
            resolver: self.resolver,
            ip_mode,
            domains: &domains,
            servers: &servers,
            paths,
            build: &options.build,
        };
        tracing::debug!(count = registry.len(), "Updating default variable map");
        let mut vars = registry.resolve_all(&sources)?;
        vars.apply_overrides(&options.overrides);

        let bundle = client_ca_bundle(&server, &domains);
        let ca_enabled = if bundle.is_empty() {
            if custom::server_client_cert_verify(&sources) || domains.client_cert_verify_enabled() {
                return Err(ProxyConfError::ClientCertCaMissing);
            }
            false
        } else {
            self.write_client_ca(&bundle)?;
            true
        };
        let ca_var = custom::client_cert_ca_enabled(ca_enabled);
        vars.set(&ca_var.key, ca_var.conf_value()?);
        registry.register(ca_var);

        if options.mode == RunMode::DisplayDefinitions {
            registry.write_descriptions(out)?;
            return Ok(Outcome::Displayed);
        }

        check_conf_dir(&paths.conf_dir)?;

        let expander = TemplateExpander {
            domains: &domains,
            servers: &servers,
            per_vhost,
            domain_ctx: &domain_ctx,
            dry_run: options.dry_run,
        };
        for pair in template_outputs(paths) {
            expander.expand(&pair.template, &pair.output, &mut vars)?;
        }

        if !is_workable(&registry) {
            tracing::warn!(
                "Configuration is not valid because no route lookup handlers exist, or because no HTTP/HTTPS upstream servers were found"
            );
        }

        Ok(if options.dry_run {
            Outcome::DryRun
        } else {
            Outcome::Generated
        })
    }

    /// The `-s` server if given (by id or name), else the local server.
    fn effective_server(&self) -> Result<Entry> {
        match &self.options.server {
            Some(host) => {
                tracing::info!(server = %host, "Loading server object");
                self.directory
                    .get_server(&ServerBy::guess(host))?
                    .ok_or_else(|| ProxyConfError::ServerNotFound(host.clone()))
            }
            None => Ok(self.directory.local_server()?),
        }
    }

    fn write_client_ca(&self, bundle: &str) -> Result<()> {
        let path = self.options.paths.default_client_ca();
        if self.options.dry_run {
            tracing::info!(path = %path.display(), "Would write client CA bundle");
            return Ok(());
        }
        tracing::debug!(path = %path.display(), "Writing client CA bundle");
        fs::write(&path, bundle).map_err(|source| ProxyConfError::Write { path, source })
    }
}

/// Print stock descriptors in registration order.
pub fn write_defaults(registry: &VarRegistry, out: &mut dyn Write) -> Result<()> {
    for var in registry.iter() {
        var.write_description(out)?;
    }
    Ok(())
}

/// Print the stock registry without touching any data source.
pub fn display_defaults(options: &GenerateOptions, out: &mut dyn Write) -> Result<()> {
    let registry = build_default_vars(&options.paths, &options.build);
    write_defaults(&registry, out)
}

/// Server CA plus every distinct domain CA, sorted and newline-joined.
pub fn client_ca_bundle(server: &Entry, domains: &DomainCollection) -> String {
    let mut cas: BTreeSet<&str> = BTreeSet::new();
    if let Some(ca) = server.get_attr(attrs::CLIENT_CERT_CA).filter(|ca| !ca.is_empty()) {
        cas.insert(ca);
    }
    for item in domains.items() {
        if let Some(ca) = item.client_cert_ca.as_deref().filter(|ca| !ca.is_empty()) {
            cas.insert(ca);
        }
    }
    cas.into_iter().collect::<Vec<_>>().join("\n")
}

/// The configuration directory must exist and be writable.
pub fn check_conf_dir(dir: &Path) -> Result<()> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() && !meta.permissions().readonly() => Ok(()),
        _ => Err(ProxyConfError::ConfDirUnusable(dir.to_path_buf())),
    }
}

fn list_len(registry: &VarRegistry, key: &str) -> usize {
    registry
        .value(key)
        .and_then(Value::as_list)
        .map_or(0, |list| list.len())
}

/// Web proxying needs HTTP and HTTPS upstreams; any proxying needs a lookup handler.
pub fn is_workable(registry: &VarRegistry) -> bool {
    let enabled = |key: &str| registry.value(key).and_then(Value::as_bool).unwrap_or(false);
    let web_enabled = enabled("web.enabled");
    let mail_enabled = enabled("mail.enabled");
    let mut workable = true;

    if web_enabled
        && (list_len(registry, "web.upstream.:servers") == 0
            || list_len(registry, "web.upstream.webclient.:servers") == 0)
    {
        tracing::info!("Web is enabled but there are no HTTP upstream webclient/mailclient servers");
        workable = false;
    }
    if web_enabled
        && (list_len(registry, "web.ssl.upstream.:servers") == 0
            || list_len(registry, "web.ssl.upstream.webclient.:servers") == 0)
    {
        tracing::info!("Web is enabled but there are no HTTPS upstream webclient/mailclient servers");
        workable = false;
    }
    if (web_enabled || mail_enabled) && list_len(registry, "zmlookup.:handlers") == 0 {
        tracing::info!("Proxy is enabled but there are no lookup handlers");
        workable = false;
    }
    workable
}

/// Log the result, mark the core output, and map to an exit code.
pub fn conclude(options: &GenerateOptions, result: Result<Outcome>) -> i32 {
    let core = options.paths.core_output();
    match result {
        Ok(Outcome::Generated) => {
            tracing::info!("Proxy configuration files are generated successfully");
            let status = RunStatus::Success;
            append_status(&core, &status);
            status.exit_code()
        }
        Ok(Outcome::DryRun) | Ok(Outcome::Displayed) => 0,
        Err(e) => {
            tracing::error!(error = %e, "Proxy configuration files generation is interrupted by errors");
            let status = RunStatus::Failed(e.to_string());
            append_status(&core, &status);
            status.exit_code()
        }
    }
}
