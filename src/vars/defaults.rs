//! The default variable table.
//!
//! Order matters only for `resolve_all` logging and `describe` output before
//! sorting; every variable reads its own sources.

use crate::collect::upstream::{Pool, PortSource, ZX_HTTPS_PORT, ZX_HTTP_PORT};
use crate::config::schema::BuildConfig;
use crate::directory::attrs;
use crate::generator::Paths;

use super::custom::{self, upstream_names as names};
use super::registry::VarRegistry;
use super::value::{OverrideSource, Value, ValueKind};
use super::var::ConfVar;

const SERVER_NAMES_HASH_MAX_SIZE: i32 = 512;
const SERVER_NAMES_HASH_BUCKET_SIZE: i32 = 64;

const SSL_CIPHERS: &str = "ECDHE-RSA-AES128-GCM-SHA256:ECDHE-ECDSA-AES128-GCM-SHA256:\
ECDHE-RSA-AES256-GCM-SHA384:ECDHE-ECDSA-AES256-GCM-SHA384:DHE-RSA-AES128-GCM-SHA256:\
DHE-DSS-AES128-GCM-SHA256:kEDH+AESGCM:ECDHE-RSA-AES128-SHA256:ECDHE-ECDSA-AES128-SHA256:\
ECDHE-RSA-AES128-SHA:ECDHE-ECDSA-AES128-SHA:ECDHE-RSA-AES256-SHA384:ECDHE-ECDSA-AES256-SHA384:\
ECDHE-RSA-AES256-SHA:ECDHE-ECDSA-AES256-SHA:DHE-RSA-AES128-SHA256:DHE-RSA-AES128-SHA:\
DHE-DSS-AES128-SHA256:DHE-RSA-AES256-SHA256:DHE-DSS-AES256-SHA:DHE-RSA-AES256-SHA:\
AES128-GCM-SHA256:AES256-GCM-SHA384:AES128:AES256:HIGH:!aNULL:!eNULL:!EXPORT:!DES:!MD5:!PSK:!RC4";

const UPLOAD_MAX_DESCRIPTION: &str = "Maximum accepted client request body size (indicated by Content-Length) - if content length exceeds this limit, then request fails with HTTP 413";

fn int(key: &str, attr: Option<&str>, default: i32, source: OverrideSource, desc: &str) -> ConfVar {
    ConfVar::new(key, attr, Value::Integer(default), ValueKind::Integer, source, desc)
}

fn long(key: &str, attr: Option<&str>, default: i64, source: OverrideSource, desc: &str) -> ConfVar {
    ConfVar::new(key, attr, Value::Long(default), ValueKind::Long, source, desc)
}

fn string(key: &str, attr: Option<&str>, default: &str, source: OverrideSource, desc: &str) -> ConfVar {
    ConfVar::new(key, attr, Value::Str(default.to_string()), ValueKind::String, source, desc)
}

fn boolean(key: &str, attr: Option<&str>, default: bool, source: OverrideSource, desc: &str) -> ConfVar {
    ConfVar::new(key, attr, Value::Bool(default), ValueKind::Boolean, source, desc)
}

fn enabler(key: &str, attr: Option<&str>, default: bool, source: OverrideSource, desc: &str) -> ConfVar {
    ConfVar::new(key, attr, Value::Bool(default), ValueKind::Enabler, source, desc)
}

fn time(key: &str, attr: Option<&str>, default_ms: i64, source: OverrideSource, desc: &str) -> ConfVar {
    ConfVar::new(key, attr, Value::Time(default_ms), ValueKind::Time, source, desc)
}

/// Build the registry with every known variable at its default.
pub fn build_default_vars(paths: &Paths, build: &BuildConfig) -> VarRegistry {
    use OverrideSource::{Config, LocalConfig, None as Fixed, Server};

    let work_dir = paths.work_dir.display().to_string();
    let mut reg = VarRegistry::new();

    // core
    reg.register(string("core.workdir", None, &work_dir, Fixed, "Working Directory for NGINX worker processes"));
    reg.register(string(
        "core.includes",
        None,
        &paths.includes_dir().display().to_string(),
        Fixed,
        "Include directory (relative to ${core.workdir}/conf)",
    ));
    reg.register(string("core.cprefix", None, &paths.conf_prefix, Fixed, "Common config file prefix"));
    reg.register(string("core.tprefix", None, &paths.template_prefix, Fixed, "Common template file prefix"));
    for var in custom::ip_mode_enablers() {
        reg.register(var);
    }

    // ssl defaults
    reg.register(string(
        "ssl.crt.default",
        None,
        &paths.default_ssl_crt().display().to_string(),
        Fixed,
        "default nginx certificate file path",
    ));
    reg.register(string(
        "ssl.key.default",
        None,
        &paths.default_ssl_key().display().to_string(),
        Fixed,
        "default nginx private key file path",
    ));
    reg.register(string(
        "ssl.clientcertmode.default",
        Some(attrs::CLIENT_CERT_MODE),
        "off",
        Server,
        "enable authentication via X.509 Client Certificate in nginx proxy (https only)",
    ));
    reg.register(custom::client_cert_ca_default(&paths.default_client_ca()));
    reg.register(int(
        "ssl.clientcertdepth.default",
        Some("zimbraReverseProxyClientCertDepth"),
        10,
        Fixed,
        "indicate how depth the verification will load the ca chain. This is useful when client crt is signed by multiple intermediate ca",
    ));

    // main
    reg.register(string("main.user", None, names::WEB, Fixed, "The user as which the worker processes will run"));
    reg.register(string("main.group", None, names::WEB, Fixed, "The group as which the worker processes will run"));
    reg.register(int("main.workers", Some("zimbraReverseProxyWorkerProcesses"), 4, Server, "Number of worker processes"));
    reg.register(string(
        "main.pidfile",
        None,
        &format!("{work_dir}/log/nginx.pid"),
        Fixed,
        "PID file path (relative to ${core.workdir})",
    ));
    reg.register(string(
        "main.logfile",
        None,
        &format!("{work_dir}/log/nginx.log"),
        Fixed,
        "Log file path (relative to ${core.workdir})",
    ));
    reg.register(string(
        "main.loglevel",
        Some("zimbraReverseProxyLogLevel"),
        "info",
        Server,
        "Log level - can be debug|info|notice|warn|error|crit",
    ));
    reg.register(int(
        "main.connections",
        Some("zimbraReverseProxyWorkerConnections"),
        10240,
        Server,
        "Maximum number of simultaneous connections per worker process",
    ));
    reg.register(string(
        "main.krb5keytab",
        Some("krb5_keytab"),
        "/opt/zimbra/conf/krb5.keytab",
        LocalConfig,
        "Path to kerberos keytab file used for GSSAPI authentication",
    ));
    reg.register(string(
        "main.accept_mutex",
        Some("zimbraReverseProxyAcceptMutex"),
        "on",
        Server,
        "accept_mutex flag for NGINX - can be on|off - on indicates regular distribution, off gets better distribution of client connections between workers",
    ));

    // memcache
    reg.register(custom::memcache_servers());
    reg.register(time(
        "memcache.timeout",
        Some("zimbraReverseProxyCacheFetchTimeout"),
        3000,
        Config,
        "Time (ms) given to a cache-fetch operation to complete",
    ));
    reg.register(time(
        "memcache.reconnect",
        Some("zimbraReverseProxyCacheReconnectInterval"),
        60000,
        Config,
        "Time (ms) after which NGINX will attempt to re-establish a broken connection to a memcache server",
    ));
    reg.register(time(
        "memcache.ttl",
        Some("zimbraReverseProxyCacheEntryTTL"),
        3_600_000,
        Config,
        "Time interval (ms) for which cached entries remain in memcache",
    ));

    // mail
    reg.register(time(
        "mail.ctimeout",
        Some("zimbraReverseProxyConnectTimeout"),
        120_000,
        Server,
        "Time interval (ms) after which a POP/IMAP proxy connection to a remote host will give up",
    ));
    reg.register(int("mail.pop3.timeout", Some("pop3_max_idle_time"), 60, LocalConfig, "pop3 network timeout before authentication"));
    reg.register(int("mail.pop3.proxytimeout", Some("pop3_max_idle_time"), 60, LocalConfig, "pop3 network timeout after authentication"));
    reg.register(int("mail.imap.timeout", Some("imap_max_idle_time"), 60, LocalConfig, "imap network timeout before authentication"));
    reg.register(custom::timeout_with_offset(
        "mail.imap.proxytimeout",
        "imap_authenticated_max_idle_time",
        1800,
        300,
        "imap network timeout after authentication",
    ));
    reg.register(boolean(
        "mail.passerrors",
        Some("zimbraReverseProxyPassErrors"),
        true,
        Server,
        "Indicates whether mail proxy will pass any protocol specific errors from the upstream server back to the downstream client",
    ));
    reg.register(time(
        "mail.auth_http_timeout",
        Some("zimbraReverseProxyRouteLookupTimeout"),
        15000,
        Server,
        "Time interval (ms) given to mail route lookup handler to respond to route lookup request (after this time elapses, Proxy fails over to next handler, or fails the request if there are no more lookup handlers)",
    ));
    reg.register(time(
        "mail.authwait",
        Some("zimbraReverseProxyAuthWaitInterval"),
        10000,
        Config,
        "Time delay (ms) after which an incorrect POP/IMAP login attempt will be rejected",
    ));
    reg.register(custom::pop3_capabilities());
    reg.register(custom::imap_capabilities());
    reg.register(string(
        "mail.imapid",
        None,
        &format!(
            "\"NAME\" \"Zimbra\" \"VERSION\" \"{}\" \"RELEASE\" \"{}\"",
            build.version, build.release
        ),
        Config,
        "NGINX response to IMAP ID command",
    ));
    reg.register(string(
        "mail.defaultrealm",
        Some("zimbraReverseProxyDefaultRealm"),
        "",
        Server,
        "Default SASL realm used in case Kerberos principal does not contain realm information",
    ));
    reg.register(boolean(
        "mail.sasl_host_from_ip",
        Some("krb5_service_principal_from_interface_address"),
        false,
        LocalConfig,
        "Whether to use incoming interface IP address to determine service principal name (if true, IP address is reverse mapped to DNS name, else host name of proxy is used)",
    ));
    reg.register(string("mail.saslapp", None, "nginx", Config, "Application name used by NGINX to initialize SASL authentication"));
    reg.register(int("mail.ipmax", Some("zimbraReverseProxyIPLoginLimit"), 0, Config, "IP Login Limit (Throttle) - 0 means infinity"));
    reg.register(time(
        "mail.ipttl",
        Some("zimbraReverseProxyIPLoginLimitTime"),
        3_600_000,
        Config,
        "Time interval (ms) after which IP Login Counter is reset",
    ));
    reg.register(int("mail.imapmax", Some("zimbraReverseProxyIPLoginImapLimit"), 0, Config, "IMAP Login Limit (Throttle) - 0 means infinity"));
    reg.register(time(
        "mail.imapttl",
        Some("zimbraReverseProxyIPLoginImapLimitTime"),
        3_600_000,
        Config,
        "Time interval (ms) after which IMAP Login Counter is reset",
    ));
    reg.register(int("mail.pop3max", Some("zimbraReverseProxyIPLoginPop3Limit"), 0, Config, "POP3 Login Limit (Throttle) - 0 means infinity"));
    reg.register(time(
        "mail.pop3ttl",
        Some("zimbraReverseProxyIPLoginPop3LimitTime"),
        3_600_000,
        Config,
        "Time interval (ms) after which POP3 Login Counter is reset",
    ));
    reg.register(string(
        "mail.iprej",
        Some("zimbraReverseProxyIpThrottleMsg"),
        "Login rejected from this IP",
        Config,
        "Rejection message for IP throttle",
    ));
    reg.register(int("mail.usermax", Some("zimbraReverseProxyUserLoginLimit"), 0, Config, "User Login Limit (Throttle) - 0 means infinity"));
    reg.register(time(
        "mail.userttl",
        Some("zimbraReverseProxyUserLoginLimitTime"),
        3_600_000,
        Config,
        "Time interval (ms) after which User Login Counter is reset",
    ));
    reg.register(string(
        "mail.userrej",
        Some("zimbraReverseProxyUserThrottleMsg"),
        "Login rejected for this user",
        Config,
        "Rejection message for User throttle",
    ));
    reg.register(boolean(
        "mail.upstream.pop3xoip",
        Some("zimbraReverseProxySendPop3Xoip"),
        true,
        Config,
        "Whether NGINX issues the POP3 XOIP command to the upstream server prior to logging in (audit purpose)",
    ));
    reg.register(boolean(
        "mail.upstream.imapid",
        Some("zimbraReverseProxySendImapId"),
        true,
        Config,
        "Whether NGINX issues the IMAP ID command to the upstream server prior to logging in (audit purpose)",
    ));
    reg.register(custom::ssl_protocols("mail.ssl.protocols", "SSL Protocols enabled for the mail proxy"));
    reg.register(boolean(
        "mail.ssl.preferserverciphers",
        None,
        true,
        Config,
        "Requires TLS protocol server ciphers be preferred over the client's ciphers",
    ));
    reg.register(string("mail.ssl.ciphers", Some("zimbraReverseProxySSLCiphers"), SSL_CIPHERS, Config, "Permitted ciphers for mail proxy"));
    reg.register(string(
        "mail.ssl.ecdh.curve",
        Some("zimbraReverseProxySSLECDHCurve"),
        "prime256v1",
        Config,
        "SSL ECDH cipher curve for mail proxy",
    ));
    reg.register(enabler(
        "mail.imap.authplain.enabled",
        Some("zimbraReverseProxyImapSaslPlainEnabled"),
        true,
        Server,
        "Whether SASL PLAIN is enabled for IMAP",
    ));
    reg.register(enabler(
        "mail.imap.authgssapi.enabled",
        Some("zimbraReverseProxyImapSaslGssapiEnabled"),
        false,
        Server,
        "Whether SASL GSSAPI is enabled for IMAP",
    ));
    reg.register(enabler(
        "mail.pop3.authplain.enabled",
        Some("zimbraReverseProxyPop3SaslPlainEnabled"),
        true,
        Server,
        "Whether SASL PLAIN is enabled for POP3",
    ));
    reg.register(enabler(
        "mail.pop3.authgssapi.enabled",
        Some("zimbraReverseProxyPop3SaslGssapiEnabled"),
        false,
        Server,
        "Whether SASL GSSAPI is enabled for POP3",
    ));
    reg.register(boolean(
        "mail.imap.literalauth",
        None,
        true,
        Config,
        "Whether NGINX uses literal strings for user name/password when logging in to upstream IMAP server - if false, NGINX uses quoted strings",
    ));
    reg.register(int("mail.imap.port", Some("zimbraImapProxyBindPort"), 143, Server, "Mail Proxy IMAP Port"));
    reg.register(string(
        "mail.imap.tls",
        Some("zimbraReverseProxyImapStartTlsMode"),
        "only",
        Server,
        "TLS support for IMAP - can be on|off|only - on indicates TLS support present, off indicates TLS support absent, only indicates TLS is enforced on unsecure channel",
    ));
    reg.register(int("mail.imaps.port", Some("zimbraImapSSLProxyBindPort"), 993, Server, "Mail Proxy IMAPS Port"));
    reg.register(int("mail.pop3.port", Some("zimbraPop3ProxyBindPort"), 110, Server, "Mail Proxy POP3 Port"));
    reg.register(string(
        "mail.pop3.tls",
        Some("zimbraReverseProxyPop3StartTlsMode"),
        "only",
        Server,
        "TLS support for POP3 - can be on|off|only - on indicates TLS support present, off indicates TLS support absent, only indicates TLS is enforced on unsecure channel",
    ));
    reg.register(int("mail.pop3s.port", Some("zimbraPop3SSLProxyBindPort"), 995, Server, "Mail Proxy POP3S Port"));
    reg.register(custom::imap_greeting());
    reg.register(custom::pop3_greeting());
    reg.register(enabler("mail.enabled", Some("zimbraReverseProxyMailEnabled"), true, Server, "Indicates whether Mail Proxy is enabled"));
    reg.register(enabler(
        "mail.imap.enabled",
        Some("zimbraReverseProxyMailImapEnabled"),
        true,
        Server,
        "Indicates whether Imap Mail Proxy is enabled",
    ));
    reg.register(enabler(
        "mail.imaps.enabled",
        Some("zimbraReverseProxyMailImapsEnabled"),
        true,
        Server,
        "Indicates whether Imaps Mail Proxy is enabled",
    ));
    reg.register(enabler(
        "mail.pop3.enabled",
        Some("zimbraReverseProxyMailPop3Enabled"),
        true,
        Server,
        "Indicates whether Pop Mail Proxy is enabled",
    ));
    reg.register(enabler(
        "mail.pop3s.enabled",
        Some("zimbraReverseProxyMailPop3sEnabled"),
        true,
        Server,
        "Indicates whether Pops Mail Proxy is enabled",
    ));
    reg.register(boolean(
        "mail.proxy.ssl",
        Some("zimbraReverseProxySSLToUpstreamEnabled"),
        true,
        Server,
        "Indicates whether using SSL to connect to upstream mail server",
    ));
    reg.register(custom::ip_throttle_whitelist());
    reg.register(custom::time_in_seconds(
        "mail.whitelist.ttl",
        "zimbraReverseProxyIPThrottleWhitelistTime",
        300_000,
        Config,
        "Time-to-live, in seconds, of the list of servers for which IP throttling is disabled",
    ));

    // web
    reg.register(string(
        "web.logfile",
        None,
        &format!("{work_dir}/log/nginx.access.log"),
        Fixed,
        "Access log file path (relative to ${core.workdir})",
    ));
    reg.register(string(
        "web.mailmode",
        Some("zimbraReverseProxyMailMode"),
        "both",
        Server,
        "Reverse Proxy Mail Mode - can be http|https|both|redirect|mixed",
    ));
    reg.register(string(
        "web.server_name.default",
        Some("zimbra_server_hostname"),
        "localhost",
        LocalConfig,
        "The server name for default server config",
    ));
    reg.register(string("web.upstream.name", None, names::WEB, Config, "Symbolic name for HTTP upstream cluster"));
    reg.register(string(
        "web.upstream.webclient.name",
        None,
        names::WEB_CLIENT,
        Config,
        "Symbolic name for HTTP upstream webclient cluster",
    ));
    reg.register(string("web.ssl.upstream.name", None, names::WEB_SSL, Config, "Symbolic name for HTTPS upstream cluster"));
    reg.register(string(
        "web.ssl.upstream.webclient.name",
        None,
        names::WEB_CLIENT_SSL,
        Config,
        "Symbolic name for HTTPS upstream webclient cluster",
    ));
    reg.register(custom::upstream_list(
        "web.upstream.:servers",
        Pool::MailClient,
        PortSource::Indirect(attrs::HTTP_PORT_ATTRIBUTE),
        "List of upstream HTTP servers used by Web Proxy (i.e. servers for which zimbraReverseProxyLookupTarget is true, and whose mail mode is http|mixed|both)",
    ));
    reg.register(custom::upstream_list(
        "web.upstream.webclient.:servers",
        Pool::WebClient,
        PortSource::Indirect(attrs::HTTP_PORT_ATTRIBUTE),
        "List of upstream HTTP webclient servers used by Web Proxy",
    ));
    reg.register(int(
        "web.server_names.max_size",
        Some("proxy_server_names_hash_max_size"),
        SERVER_NAMES_HASH_MAX_SIZE,
        LocalConfig,
        "the server names hash max size, needed to be increased if too many virtual host names are added",
    ));
    reg.register(int(
        "web.server_names.bucket_size",
        Some("proxy_server_names_hash_bucket_size"),
        SERVER_NAMES_HASH_BUCKET_SIZE,
        LocalConfig,
        "the server names hash bucket size, needed to be increased if too many virtual host names are added",
    ));
    reg.register(custom::upstream_list(
        "web.ssl.upstream.:servers",
        Pool::MailClient,
        PortSource::Indirect(attrs::HTTPS_PORT_ATTRIBUTE),
        "List of upstream HTTPS servers used by Web Proxy (i.e. servers for which zimbraReverseProxyLookupTarget is true, and whose mail mode is https|mixed|both)",
    ));
    reg.register(custom::upstream_list(
        "web.ssl.upstream.webclient.:servers",
        Pool::WebClient,
        PortSource::Indirect(attrs::HTTPS_PORT_ATTRIBUTE),
        "List of upstream HTTPS webclient servers used by Web Proxy",
    ));
    reg.register(long("web.uploadmax", Some("zimbraFileUploadMaxSize"), 10_485_760, Server, UPLOAD_MAX_DESCRIPTION));
    reg.register(custom::error_pages());
    reg.register(int("web.http.port", Some("zimbraMailProxyPort"), 0, Server, "Web Proxy HTTP Port"));
    reg.register(long("web.http.maxbody", Some("zimbraFileUploadMaxSize"), 10_485_760, Server, UPLOAD_MAX_DESCRIPTION));
    reg.register(int("web.https.port", Some("zimbraMailSSLProxyPort"), 0, Server, "Web Proxy HTTPS Port"));
    reg.register(long("web.https.maxbody", Some("zimbraFileUploadMaxSize"), 10_485_760, Server, UPLOAD_MAX_DESCRIPTION));
    reg.register(custom::ssl_protocols("web.ssl.protocols", "SSL Protocols enabled for the web proxy"));
    reg.register(boolean(
        "web.ssl.preferserverciphers",
        None,
        true,
        Config,
        "Requires TLS protocol server ciphers be preferred over the client's ciphers",
    ));
    reg.register(string("web.ssl.ciphers", Some("zimbraReverseProxySSLCiphers"), SSL_CIPHERS, Config, "Permitted ciphers for web proxy"));
    reg.register(string(
        "web.ssl.ecdh.curve",
        Some("zimbraReverseProxySSLECDHCurve"),
        "prime256v1",
        Config,
        "SSL ECDH cipher curve for web proxy",
    ));
    reg.register(int("web.http.uport", Some("zimbraMailPort"), 80, Server, "Web upstream server port"));
    reg.register(int(
        "web.upstream.connect.timeout",
        Some("zimbraReverseProxyUpstreamConnectTimeout"),
        25,
        Server,
        "upstream connect timeout",
    ));
    reg.register(custom::time_in_seconds(
        "web.upstream.read.timeout",
        "zimbraReverseProxyUpstreamReadTimeout",
        60_000,
        Server,
        "upstream read timeout",
    ));
    reg.register(custom::time_in_seconds(
        "web.upstream.send.timeout",
        "zimbraReverseProxyUpstreamSendTimeout",
        60_000,
        Server,
        "upstream send timeout",
    ));
    reg.register(custom::time_in_seconds(
        "web.upstream.polling.timeout",
        "zimbraReverseProxyUpstreamPollingTimeout",
        3_600_000,
        Server,
        "the response timeout for Microsoft Active Sync polling",
    ));
    reg.register(enabler(
        "web.enabled",
        Some("zimbraReverseProxyHttpEnabled"),
        false,
        Server,
        "Indicates whether HTTP proxying is enabled",
    ));
    reg.register(string(
        "web.upstream.exactversioncheck",
        Some("zimbraReverseProxyExactServerVersionCheck"),
        "on",
        Server,
        "Indicates whether nginx will match exact server version against the version received in the client request",
    ));
    reg.register(custom::http_enabler());
    reg.register(custom::https_enabler());
    reg.register(custom::upstream_target(
        "web.upstream.target",
        names::WEB,
        names::WEB_SSL,
        "The target of proxy_pass for web proxy",
    ));
    reg.register(custom::upstream_target(
        "web.upstream.webclient.target",
        names::WEB_CLIENT,
        names::WEB_CLIENT_SSL,
        "The target of proxy_pass for web client proxy",
    ));

    // lookup
    reg.register(custom::lookup_available());
    reg.register(custom::web_available());
    reg.register(custom::lookup_handlers());
    reg.register(time(
        "zmlookup.timeout",
        Some("zimbraReverseProxyRouteLookupTimeout"),
        15000,
        Server,
        "Time interval (ms) given to lookup handler to respond to route lookup request (after this time elapses, Proxy fails over to next handler, or fails the request if there are no more lookup handlers)",
    ));
    reg.register(time(
        "zmlookup.retryinterval",
        Some("zimbraReverseProxyRouteLookupTimeoutCache"),
        60000,
        Server,
        "Time interval (ms) given to lookup handler to cache a failed response to route a previous lookup request (after this time elapses, Proxy retries this host)",
    ));
    reg.register(string(
        "zmlookup.dpasswd",
        Some("ldap_nginx_password"),
        "zmnginx",
        LocalConfig,
        "Password for master credentials used by NGINX to log in to upstream for GSSAPI authentication",
    ));
    reg.register(boolean(
        "zmlookup.caching",
        Some("zimbraReverseProxyZmlookupCachingEnabled"),
        true,
        Server,
        "Whether to turn on nginx lookup caching",
    ));
    reg.register(string(
        "zmprefix.url",
        Some("zimbraMailURL"),
        "/",
        Config,
        "http URL prefix for where the zimbra app resides on upstream server",
    ));

    // sso
    reg.register(int(
        "web.sso.certauth.port",
        Some("zimbraMailSSLProxyClientCertPort"),
        0,
        Server,
        "reverse proxy client cert auth port",
    ));
    reg.register(custom::sso_certauth_default_enabler());
    reg.register(custom::sso_enabler());
    reg.register(custom::sso_default_enabler());
    reg.register(custom::sso_redirect_enabler());

    // admin
    reg.register(enabler(
        "web.admin.default.enabled",
        Some("zimbraReverseProxyAdminEnabled"),
        false,
        Server,
        "Inidicate whether admin console proxy is enabled",
    ));
    reg.register(int("web.admin.port", Some("zimbraAdminProxyPort"), 9071, Server, "Admin console proxy port"));
    reg.register(int("web.admin.uport", Some("zimbraAdminPort"), 7071, Server, "Admin console upstream port"));
    reg.register(string(
        "web.admin.upstream.name",
        None,
        names::ADMIN,
        Config,
        "Symbolic name for admin console upstream cluster",
    ));
    reg.register(string(
        "web.admin.upstream.adminclient.name",
        None,
        names::ADMIN_CLIENT,
        Config,
        "Symbolic name for admin client console upstream cluster",
    ));
    reg.register(custom::upstream_list(
        "web.admin.upstream.:servers",
        Pool::MailClient,
        PortSource::Indirect(attrs::ADMIN_PORT_ATTRIBUTE),
        "List of upstream admin console servers used by Web Proxy",
    ));
    reg.register(custom::upstream_list(
        "web.admin.upstream.adminclient.:servers",
        Pool::AdminClient,
        PortSource::Indirect(attrs::ADMIN_PORT_ATTRIBUTE),
        "List of upstream admin client servers used by Web Proxy",
    ));
    reg.register(custom::timeout_with_offset(
        "web.upstream.noop.timeout",
        "zimbra_noop_max_timeout",
        1200,
        20,
        "the response timeout for NoOpRequest",
    ));
    reg.register(custom::timeout_with_offset(
        "web.upstream.waitset.timeout",
        "zimbra_waitset_max_request_timeout",
        1200,
        20,
        "the response timeout for WaitSetRequest",
    ));

    // ews / login
    reg.register(custom::populated_enabler(
        "web.ews.upstream.disable",
        attrs::UPSTREAM_EWS_SERVERS,
        "Indicates whether EWS upstream servers blob in nginx.conf.web should be populated (false unless zimbraReverseProxyUpstreamEwsServers is populated)",
    ));
    reg.register(custom::upstream_list(
        "web.upstream.ewsserver.:servers",
        Pool::Named(attrs::UPSTREAM_EWS_SERVERS),
        PortSource::Indirect(attrs::HTTP_PORT_ATTRIBUTE),
        "List of upstream EWS servers used by Web Proxy",
    ));
    reg.register(custom::upstream_list(
        "web.ssl.upstream.ewsserver.:servers",
        Pool::Named(attrs::UPSTREAM_EWS_SERVERS),
        PortSource::Indirect(attrs::HTTPS_PORT_ATTRIBUTE),
        "List of upstream EWS SSL servers used by Web Proxy",
    ));
    reg.register(string("web.ews.upstream.name", None, names::EWS, Config, "Symbolic name for ews upstream server cluster"));
    reg.register(string(
        "web.ssl.ews.upstream.name",
        None,
        names::EWS_SSL,
        Config,
        "Symbolic name for https ews upstream server cluster",
    ));
    reg.register(custom::populated_enabler(
        "web.login.upstream.disable",
        attrs::UPSTREAM_LOGIN_SERVERS,
        "Indicates whether upstream Login servers blob in nginx.conf.web should be populated (false unless zimbraReverseProxyUpstreamLoginServers is populated)",
    ));
    reg.register(custom::upstream_list(
        "web.upstream.loginserver.:servers",
        Pool::Named(attrs::UPSTREAM_LOGIN_SERVERS),
        PortSource::Indirect(attrs::HTTP_PORT_ATTRIBUTE),
        "List of upstream Login servers used by Web Proxy",
    ));
    reg.register(custom::upstream_list(
        "web.ssl.upstream.loginserver.:servers",
        Pool::Named(attrs::UPSTREAM_LOGIN_SERVERS),
        PortSource::Indirect(attrs::HTTPS_PORT_ATTRIBUTE),
        "List of upstream Login SSL servers used by Web Proxy",
    ));
    reg.register(string(
        "web.login.upstream.name",
        None,
        names::LOGIN,
        Config,
        "Symbolic name for upstream login server cluster",
    ));
    reg.register(string(
        "web.ssl.login.upstream.name",
        None,
        names::LOGIN_SSL,
        Config,
        "Symbolic name for https upstream login server cluster",
    ));
    reg.register(string("web.login.upstream.url", Some("zimbraMailURL"), "/", Server, "Zimbra Login URL"));
    reg.register(custom::upstream_target(
        "web.upstream.login.target",
        names::LOGIN,
        names::LOGIN_SSL,
        "The login target of proxy_pass for web proxy",
    ));
    reg.register(custom::upstream_target(
        "web.upstream.ews.target",
        names::EWS,
        names::EWS_SSL,
        "The ews target of proxy_pass for web proxy",
    ));

    // ssl session
    reg.register(custom::time_in_seconds(
        "ssl.session.timeout",
        "zimbraReverseProxySSLSessionTimeout",
        600_000,
        Server,
        "SSL session timeout value for the proxy in secs",
    ));
    reg.register(custom::ssl_session_cache_size());

    // xmpp
    reg.register(custom::xmpp_upstream_proto());
    reg.register(custom::xmpp_bosh_enabler());
    reg.register(enabler(
        "web.xmpp.bosh.enabled",
        Some("zimbraReverseProxyXmppBoshEnabled"),
        true,
        Server,
        "Indicates whether XMPP/Bosh Reverse Proxy is enabled",
    ));
    reg.register(string(
        "web.xmpp.local.bind.url",
        Some("zimbraReverseProxyXmppBoshLocalHttpBindURL"),
        "/http-bind",
        Server,
        "Local HTTP-BIND URL prefix where ZWC sends XMPP over BOSH requests",
    ));
    reg.register(string(
        "web.xmpp.remote.bind.url",
        Some("zimbraReverseProxyXmppBoshRemoteHttpBindURL"),
        "",
        Server,
        "Remote HTTP-BIND URL prefix for an external XMPP server where XMPP over BOSH requests need to be proxied",
    ));
    reg.register(string(
        "web.xmpp.bosh.hostname",
        Some("zimbraReverseProxyXmppBoshHostname"),
        "",
        Server,
        "Hostname of the external XMPP server where XMPP over BOSH requests need to be proxied",
    ));
    reg.register(int(
        "web.xmpp.bosh.port",
        Some("zimbraReverseProxyXmppBoshPort"),
        0,
        Server,
        "Port number of the external XMPP server where XMPP over BOSH requests need to be proxied",
    ));
    reg.register(custom::time_in_seconds(
        "web.xmpp.bosh.timeout",
        "zimbraReverseProxyXmppBoshTimeout",
        60_000,
        Server,
        "the response timeout for an external XMPP/BOSH server",
    ));
    reg.register(enabler(
        "web.xmpp.bosh.use_ssl",
        Some("zimbraReverseProxyXmppBoshSSL"),
        true,
        Server,
        "Indicates whether XMPP/Bosh uses SSL",
    ));

    // tls extras
    reg.register(custom::dhparam_enabler());
    reg.register(string(
        "web.ssl.dhparam.file",
        None,
        &paths.default_dhparam().display().to_string(),
        Fixed,
        "Filename with DH parameters for EDH ciphers to be used by the proxy",
    ));
    reg.register(custom::fair_shm_size());
    reg.register(custom::strict_server_name());

    // zx
    reg.register(custom::upstream_target("web.upstream.zx", names::ZX, names::ZX_SSL, "The target for zx paths"));
    reg.register(string("web.upstream.zx.name", None, names::ZX, Config, "Symbolic name for HTTP zx upstream"));
    reg.register(string("web.ssl.upstream.zx.name", None, names::ZX_SSL, Config, "Symbolic name for HTTPS zx upstream"));
    reg.register(custom::upstream_list(
        "web.upstream.zx.:servers",
        Pool::MailClient,
        PortSource::Fixed(ZX_HTTP_PORT),
        "List of upstream HTTP servers towards zx used by Web Proxy",
    ));
    reg.register(custom::upstream_list(
        "web.ssl.upstream.zx.:servers",
        Pool::MailClient,
        PortSource::Fixed(ZX_HTTPS_PORT),
        "List of upstream HTTPS servers towards zx used by Web Proxy",
    ));

    reg.register(custom::listen_addresses());
    reg.register(custom::default_add_headers());

    reg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::Entry;
    use crate::vars::var::tests::Fixture;

    fn registry() -> VarRegistry {
        build_default_vars(&Paths::new("/opt/zimbra"), &BuildConfig::default())
    }

    #[test]
    fn test_fixed_defaults_render_from_paths() {
        let reg = registry();
        let map = reg.render().unwrap();
        assert_eq!(map.get("core.workdir"), Some("/opt/zimbra"));
        assert_eq!(map.get("core.includes"), Some("/opt/zimbra/conf/nginx/includes"));
        assert_eq!(map.get("ssl.crt.default"), Some("/opt/zimbra/conf/nginx.crt"));
        assert_eq!(map.get("main.pidfile"), Some("/opt/zimbra/log/nginx.pid"));
        assert_eq!(map.get("web.uploadmax"), Some("10m"));
        assert_eq!(map.get("memcache.ttl"), Some("3600000ms"));
    }

    #[test]
    fn test_none_source_vars_equal_defaults() {
        let server = Entry::new("proxy")
            .with_attr("zimbraReverseProxyClientCertDepth", "3")
            .with_attr(attrs::SERVICE_HOSTNAME, "proxy");
        let fx = Fixture::new(Entry::new("config"), server);
        let mut reg = registry();
        for var in reg.iter().filter(|v| v.source == OverrideSource::None) {
            assert!(var.value == var.default, "{} should start at its default", var.key);
        }
        let fixed: Vec<String> = reg
            .iter()
            .filter(|v| v.source == OverrideSource::None)
            .map(|v| v.key.clone())
            .collect();
        for key in &fixed {
            let var = reg.get_mut(key).unwrap();
            var.update(&fx.sources()).unwrap();
            assert!(var.value == var.default, "{key} changed after update");
        }
        assert_eq!(
            reg.get("ssl.clientcertdepth.default").unwrap().conf_value().unwrap(),
            "10"
        );
    }

    #[test]
    fn test_enablers_only_render_blank_or_hash() {
        let reg = registry();
        for var in reg.iter().filter(|v| v.kind == ValueKind::Enabler) {
            let text = var.conf_value().unwrap();
            assert!(text.is_empty() || text == "#", "{} rendered {text:?}", var.key);
        }
    }

    #[test]
    fn test_resolved_enablers_only_render_blank_or_hash() {
        let config = Entry::new("config")
            .with_attr(attrs::HTTP_PORT_ATTRIBUTE, "zimbraMailPort")
            .with_attr(attrs::HTTPS_PORT_ATTRIBUTE, "zimbraMailSSLPort")
            .with_attr(attrs::ADMIN_PORT_ATTRIBUTE, "zimbraAdminPort");
        let server = Entry::new("127.0.0.1")
            .with_attr(attrs::SERVICE_HOSTNAME, "127.0.0.1")
            .with_multi_attr(
                attrs::SERVICE_ENABLED,
                ["memcached", "service", "zimbra", "zimbraAdmin"],
            )
            .with_attr(attrs::LOOKUP_TARGET, "TRUE")
            .with_attr(attrs::MAIL_MODE, "https")
            .with_attr(attrs::CLIENT_CERT_MODE, "on")
            .with_attr(attrs::UPSTREAM_EWS_SERVERS, "127.0.0.1")
            .with_attr("zimbraMailPort", "8080")
            .with_attr("zimbraMailSSLPort", "8443")
            .with_attr("zimbraAdminPort", "7071")
            .with_attr("zimbraReverseProxyHttpEnabled", "TRUE")
            .with_attr("zimbraReverseProxyMailEnabled", "TRUE");
        let fx = Fixture::new(config, server);

        let mut reg = registry();
        let vars = reg.resolve_all(&fx.sources()).unwrap();
        let mut rendered = Vec::new();
        for var in reg.iter().filter(|v| v.kind == ValueKind::Enabler) {
            let text = vars.get(&var.key).unwrap();
            assert!(text.is_empty() || text == "#", "{} rendered {text:?}", var.key);
            rendered.push(text.to_string());
        }
        assert!(rendered.iter().any(String::is_empty));
        assert!(rendered.iter().any(|t| t == "#"));
        assert_eq!(vars.get("web.sso.default.enabled"), Some(""));
        assert_eq!(vars.get("web.xmpp.bosh.upstream.disable"), Some("#"));
    }

    #[test]
    fn test_registry_has_every_upstream_role() {
        let reg = registry();
        for key in [
            "web.upstream.:servers",
            "web.upstream.webclient.:servers",
            "web.ssl.upstream.:servers",
            "web.ssl.upstream.webclient.:servers",
            "web.admin.upstream.:servers",
            "web.admin.upstream.adminclient.:servers",
            "web.upstream.ewsserver.:servers",
            "web.ssl.upstream.ewsserver.:servers",
            "web.upstream.loginserver.:servers",
            "web.ssl.upstream.loginserver.:servers",
            "web.upstream.zx.:servers",
            "web.ssl.upstream.zx.:servers",
            "memcache.:servers",
            "zmlookup.:handlers",
        ] {
            assert!(reg.contains(key), "missing {key}");
        }
    }

    #[test]
    fn test_imapid_carries_build_info() {
        let build = BuildConfig {
            version: "9.0.0".into(),
            release: "GA".into(),
        };
        let reg = build_default_vars(&Paths::new("/opt/zimbra"), &build);
        assert_eq!(
            reg.get("mail.imapid").unwrap().conf_value().unwrap(),
            "\"NAME\" \"Zimbra\" \"VERSION\" \"9.0.0\" \"RELEASE\" \"GA\""
        );
    }
}
