use orc_domain::config::Config;

#[test]
fn default_bind_is_all_interfaces() {
    let config = Config::default();
    assert_eq!(config.server.bind, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
}

#[test]
fn explicit_server_section_parses() {
    let toml_str = r#"
[server]
bind = "127.0.0.1"
port = 3210
"#;
    let config = Config::from_str(toml_str).unwrap();
    assert_eq!(config.server.bind, "127.0.0.1");
    assert_eq!(config.server.port, 3210);
}

#[test]
fn mcp_servers_parse_as_ordered_list() {
    let toml_str = r#"
[[mcp_servers]]
id = "s1"
name = "primary"
enabled = true
transport = "sse"
url = "http://localhost:9000/sse"
"#;
    let config = Config::from_str(toml_str).unwrap();
    assert_eq!(config.mcp_servers.len(), 1);
    assert_eq!(config.mcp_servers[0].id, "s1");
}
