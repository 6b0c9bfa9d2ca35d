//! Shared fixtures for generation tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::io;
use std::net::IpAddr;

use proxy_confgen::directory::{HostResolver, LocalConfig, SnapshotDirectory};
use proxy_confgen::generator::outputs::template_outputs;
use proxy_confgen::generator::{GenerateOptions, Generator, Paths};
use tempfile::TempDir;

pub const MBS1_ID: &str = "2b4e28ba-2fa1-11d2-883f-0016d3cca427";
pub const DOCS1_ID: &str = "3c4e28ba-2fa1-11d2-883f-0016d3cca427";
pub const SSO_CA: &str = "-----BEGIN CERTIFICATE-----SSO";

/// A proxy, a mailbox, a docs server, and two domains with vhost SSL settings.
pub const SNAPSHOT: &str = r#"
local_server = "proxy.example.com"

[config]
zimbraReverseProxyHttpPortAttribute = "zimbraMailPort"
zimbraReverseProxyHttpSSLPortAttribute = "zimbraMailSSLPort"
zimbraReverseProxyAdminPortAttribute = "zimbraAdminPort"

[[servers]]
zimbraId = "1b4e28ba-2fa1-11d2-883f-0016d3cca427"
zimbraServiceHostname = "proxy.example.com"
zimbraServiceEnabled = ["proxy", "memcached"]
zimbraReverseProxyWorkerProcesses = 8
zimbraReverseProxyHttpEnabled = true
zimbraReverseProxyMailEnabled = true
zimbraReverseProxyGenConfigPerVirtualHostname = true
zimbraMailProxyPort = 80
zimbraMailSSLProxyPort = 443

[[servers]]
zimbraId = "2b4e28ba-2fa1-11d2-883f-0016d3cca427"
zimbraServiceHostname = "mbs1.example.com"
zimbraServiceEnabled = ["mailbox", "service", "zimbra", "zimbraAdmin"]
zimbraReverseProxyLookupTarget = true
zimbraMailMode = "https"
zimbraMailPort = 8080
zimbraMailSSLPort = 8443
zimbraAdminPort = 7071
zimbraServerVersionMajor = 9
zimbraServerVersionMinor = 0

[[servers]]
zimbraId = "3c4e28ba-2fa1-11d2-883f-0016d3cca427"
zimbraServiceHostname = "docs1.example.com"
zimbraServiceEnabled = ["docs"]

[[domains]]
zimbraDomainName = "example.com"
zimbraVirtualHostname = ["mail.example.com", "webmail.example.com"]
zimbraSSLCertificate = "CERT"
zimbraSSLPrivateKey = "KEY"

[[domains]]
zimbraDomainName = "sso.com"
zimbraVirtualHostname = "login.sso.com"
zimbraReverseProxyClientCertMode = "on"
zimbraReverseProxyClientCertCA = "-----BEGIN CERTIFICATE-----SSO"

[[domains]]
zimbraDomainName = "plain.com"
zimbraVirtualHostname = "mail.plain.com"
"#;

pub fn snapshot() -> SnapshotDirectory {
    SnapshotDirectory::from_toml_str(SNAPSHOT).unwrap()
}

/// Static host table.
pub struct MapResolver(HashMap<String, Vec<IpAddr>>);

impl MapResolver {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        let mut map: HashMap<String, Vec<IpAddr>> = HashMap::new();
        for (host, ip) in entries {
            map.entry(host.to_string())
                .or_default()
                .push(ip.parse().unwrap());
        }
        Self(map)
    }

    pub fn without(mut self, host: &str) -> Self {
        self.0.remove(host);
        self
    }
}

impl HostResolver for MapResolver {
    fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        self.0
            .get(host)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("unknown host {host}")))
    }
}

/// Every host in `SNAPSHOT`.
pub fn resolver() -> MapResolver {
    MapResolver::new(&[
        ("proxy.example.com", "10.0.0.1"),
        ("mbs1.example.com", "10.0.0.2"),
        ("mail.example.com", "10.0.0.10"),
        ("webmail.example.com", "10.0.0.11"),
        ("login.sso.com", "10.0.0.12"),
    ])
}

pub const CORE_TEMPLATE: &str =
    "worker_processes ${main.workers};\ninclude ${core.includes}/${core.cprefix}.main;\n";

pub const HTTPS_TEMPLATE: &str = "!{explode domain(vhn)}
# https server per virtual host
server {
    listen ${vip}${web.https.port};
    server_name ${vhn};
    ssl_certificate ${ssl.crt};
}";

pub const SSO_TEMPLATE: &str = "!{explode domain(vhn, sso)}
server_name ${vhn}; verify ${ssl.clientcertmode}; ca ${ssl.clientcertca};";

pub const DOCS_TEMPLATE: &str = "!{explode server(docs)}
# one upstream per docs server
server ${server_hostname}:80; # ${server_id}";

/// Temporary working directory with a template for every output.
pub struct Workspace {
    pub dir: TempDir,
    pub options: GenerateOptions,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path());
        fs::create_dir_all(paths.includes_dir()).unwrap();
        fs::create_dir_all(&paths.template_dir).unwrap();
        for pair in template_outputs(&paths) {
            fs::write(&pair.template, "# stock template\n").unwrap();
        }

        let options = GenerateOptions {
            paths,
            ..GenerateOptions::default()
        };
        let ws = Self { dir, options };
        fs::write(ws.options.paths.core_template(), CORE_TEMPLATE).unwrap();
        ws.write_template("memcache", "${memcache.:servers}");
        ws.write_template("zmlookup", "route ${zmlookup.:handlers};");
        ws.write_template("web", "upstream ${web.upstream.name} {\n    ${web.upstream.:servers}}");
        ws.write_template("web.https", HTTPS_TEMPLATE);
        ws.write_template("web.sso", SSO_TEMPLATE);
        ws.write_template("docs.upstream", DOCS_TEMPLATE);
        ws
    }

    pub fn write_template(&self, name: &str, body: &str) {
        fs::write(self.options.paths.template_path(name), body).unwrap();
    }

    pub fn remove_template(&self, name: &str) {
        fs::remove_file(self.options.paths.template_path(name)).unwrap();
    }

    pub fn output(&self, name: &str) -> String {
        fs::read_to_string(self.options.paths.output_path(name)).unwrap()
    }

    pub fn output_exists(&self, name: &str) -> bool {
        self.options.paths.output_path(name).exists()
    }

    pub fn core(&self) -> String {
        fs::read_to_string(self.options.paths.core_output()).unwrap()
    }

    /// Run against `SNAPSHOT`; returns the exit code and anything displayed.
    pub fn run_with(&self, directory: &SnapshotDirectory, resolver: &MapResolver) -> (i32, String) {
        let local = LocalConfig::default();
        let mut out = Vec::new();
        let code = Generator::new(directory, resolver, &local, &self.options).execute(&mut out);
        (code, String::from_utf8(out).unwrap())
    }

    pub fn run(&self) -> (i32, String) {
        self.run_with(&snapshot(), &resolver())
    }
}
