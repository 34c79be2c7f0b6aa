use super::{decode, nullable, or_na, placeholder, warning_note, Panel, PanelError};
use crate::surface::{escape, PanelSink, SurfaceId};
use serde::Deserialize;
use serde_json::Value;

const NO_INTERFACES: &str = "No network interfaces found";
const NO_ACTIVE_INTERFACES: &str = "No active interfaces";
const IPV6_DISPLAY_CHARS: usize = 20;
const HEADER_SEPARATOR: &str = " | ";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct NetworkRecord {
    hostname: Option<String>,
    domain: Option<String>,
    ipv4_default_gateway: Option<String>,
    #[serde(deserialize_with = "nullable")]
    dns_servers: Vec<String>,
    tcp: Option<TcpRecord>,
    udp: Option<UdpRecord>,
    interfaces: Option<Vec<InterfaceRecord>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TcpRecord {
    connections_active: Option<u64>,
    connections_passive: Option<u64>,
    connections_failures: Option<u64>,
    connections_established: Option<u64>,
    segments_sent: Option<u64>,
    segments_received: Option<u64>,
    segments_retransmitted: Option<u64>,
    in_errors: Option<u64>,
    out_resets: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UdpRecord {
    datagrams_sent: Option<u64>,
    datagrams_received: Option<u64>,
    datagrams_no_port: Option<u64>,
    datagrams_received_errors: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct InterfaceRecord {
    name: Option<String>,
    display_name: Option<String>,
    mac_address: Option<String>,
    speed_formatted: Option<String>,
    connected: Option<bool>,
    #[serde(deserialize_with = "nullable")]
    ipv4_addresses: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    ipv6_addresses: Vec<String>,
    packets_recv: Option<u64>,
    packets_sent: Option<u64>,
    bytes_recv: Option<u64>,
    bytes_sent: Option<u64>,
    bytes_recv_formatted: Option<String>,
    bytes_sent_formatted: Option<String>,
    download_rate_formatted: Option<String>,
    upload_rate_formatted: Option<String>,
    requires_sudo: Option<bool>,
}

pub type StatBlock = Vec<(&'static str, u64)>;

#[derive(Debug, Clone, PartialEq)]
pub struct AddressDisplay {
    pub shown: String,
    pub full: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceView {
    pub name: String,
    pub display_name: String,
    pub mac_address: String,
    pub speed: String,
    pub ipv4: Vec<String>,
    pub ipv6: Vec<AddressDisplay>,
    pub download_rate: String,
    pub upload_rate: String,
    pub received: String,
    pub sent: String,
    pub packets_recv: u64,
    pub packets_sent: u64,
    pub avg_recv_packet: u64,
    pub avg_sent_packet: u64,
    pub limited: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Interfaces {
    NoneFound,
    NoneActive,
    Active(Vec<InterfaceView>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkView {
    pub header: String,
    pub dns_servers: Vec<String>,
    pub tcp: Option<StatBlock>,
    pub udp: Option<StatBlock>,
    pub interfaces: Interfaces,
}

pub fn avg_packet_size(bytes: u64, packets: u64) -> u64 {
    if packets == 0 {
        return 0;
    }
    (bytes as f64 / packets as f64).round() as u64
}

pub fn display_ipv6(addr: &str) -> AddressDisplay {
    if addr.chars().count() > IPV6_DISPLAY_CHARS {
        AddressDisplay {
            shown: format!("{}...", addr.chars().take(IPV6_DISPLAY_CHARS).collect::<String>()),
            full: Some(addr.to_string()),
        }
    } else {
        AddressDisplay {
            shown: addr.to_string(),
            full: None,
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("unknown"))
}

fn compose_header(record: &NetworkRecord) -> String {
    let mut pieces = Vec::new();
    if let Some(host) = present(record.hostname.as_deref()) {
        pieces.push(host.to_string());
    }
    if let Some(domain) = present(record.domain.as_deref()) {
        pieces.push(format!("Domain: {}", domain));
    }
    if let Some(gateway) = present(record.ipv4_default_gateway.as_deref()) {
        pieces.push(format!("Gateway: {}", gateway));
    }
    if pieces.is_empty() {
        "Unknown host".to_string()
    } else {
        pieces.join(HEADER_SEPARATOR)
    }
}

fn tcp_block(tcp: &TcpRecord) -> StatBlock {
    vec![
        ("Active connections", tcp.connections_active.unwrap_or(0)),
        ("Passive connections", tcp.connections_passive.unwrap_or(0)),
        ("Failed connections", tcp.connections_failures.unwrap_or(0)),
        ("Established", tcp.connections_established.unwrap_or(0)),
        ("Segments sent", tcp.segments_sent.unwrap_or(0)),
        ("Segments received", tcp.segments_received.unwrap_or(0)),
        ("Retransmitted", tcp.segments_retransmitted.unwrap_or(0)),
        ("In errors", tcp.in_errors.unwrap_or(0)),
        ("Out resets", tcp.out_resets.unwrap_or(0)),
    ]
}

fn udp_block(udp: &UdpRecord) -> StatBlock {
    vec![
        ("Datagrams sent", udp.datagrams_sent.unwrap_or(0)),
        ("Datagrams received", udp.datagrams_received.unwrap_or(0)),
        ("No port", udp.datagrams_no_port.unwrap_or(0)),
        ("Receive errors", udp.datagrams_received_errors.unwrap_or(0)),
    ]
}

fn map_interface(iface: InterfaceRecord) -> InterfaceView {
    let packets_recv = iface.packets_recv.unwrap_or(0);
    let packets_sent = iface.packets_sent.unwrap_or(0);
    InterfaceView {
        name: or_na(iface.name.as_deref()),
        display_name: iface.display_name.unwrap_or_default(),
        mac_address: or_na(iface.mac_address.as_deref()),
        speed: or_na(iface.speed_formatted.as_deref()),
        ipv6: iface.ipv6_addresses.iter().map(|a| display_ipv6(a)).collect(),
        ipv4: iface.ipv4_addresses,
        download_rate: or_na(iface.download_rate_formatted.as_deref()),
        upload_rate: or_na(iface.upload_rate_formatted.as_deref()),
        received: or_na(iface.bytes_recv_formatted.as_deref()),
        sent: or_na(iface.bytes_sent_formatted.as_deref()),
        packets_recv,
        packets_sent,
        avg_recv_packet: avg_packet_size(iface.bytes_recv.unwrap_or(0), packets_recv),
        avg_sent_packet: avg_packet_size(iface.bytes_sent.unwrap_or(0), packets_sent),
        limited: iface.requires_sudo.unwrap_or(false),
    }
}

pub struct NetworkPanel;

impl Panel for NetworkPanel {
    type View = NetworkView;

    const NAME: &'static str = "network";
    const SURFACES: &'static [SurfaceId] = &[SurfaceId::Network];

    fn map(&self, raw: &Value) -> Result<NetworkView, PanelError> {
        let record: NetworkRecord = decode(Self::NAME, raw)?;
        let header = compose_header(&record);
        let tcp = record.tcp.as_ref().map(tcp_block);
        let udp = record.udp.as_ref().map(udp_block);
        let interfaces = match record.interfaces {
            None => Interfaces::NoneFound,
            Some(list) if list.is_empty() => Interfaces::NoneFound,
            Some(list) => {
                let active = list
                    .into_iter()
                    .filter(|i| i.connected.unwrap_or(false) && !i.ipv4_addresses.is_empty())
                    .map(map_interface)
                    .collect::<Vec<_>>();
                if active.is_empty() {
                    Interfaces::NoneActive
                } else {
                    Interfaces::Active(active)
                }
            }
        };
        Ok(NetworkView {
            header,
            dns_servers: record.dns_servers,
            tcp,
            udp,
            interfaces,
        })
    }

    fn render(&self, view: &NetworkView, sink: &mut dyn PanelSink) {
        let mut out = Vec::new();
        out.push(format!(
            "<div class=\"network-header\">{}</div>",
            escape(&view.header)
        ));
        if !view.dns_servers.is_empty() {
            out.push(format!(
                "<div class=\"small\">DNS: {}</div>",
                escape(&view.dns_servers.join(", "))
            ));
        }
        if let Some(tcp) = &view.tcp {
            out.push(render_stats("TCP", tcp));
        }
        if let Some(udp) = &view.udp {
            out.push(render_stats("UDP", udp));
        }
        match &view.interfaces {
            Interfaces::NoneFound => out.push(placeholder(NO_INTERFACES)),
            Interfaces::NoneActive => out.push(warning_note(NO_ACTIVE_INTERFACES)),
            Interfaces::Active(list) => out.extend(list.iter().map(render_interface)),
        }
        sink.replace(SurfaceId::Network, out.join("\n"));
    }
}

fn render_stats(title: &str, stats: &StatBlock) -> String {
    let rows = stats
        .iter()
        .map(|(label, value)| format!("<div class=\"small\">{}: {}</div>", label, value))
        .collect::<String>();
    format!("<div class=\"stats\"><h6>{}</h6>{}</div>", title, rows)
}

fn render_interface(iface: &InterfaceView) -> String {
    let ipv6 = iface
        .ipv6
        .iter()
        .map(|a| match &a.full {
            Some(full) => format!("<span title=\"{}\">{}</span>", escape(full), escape(&a.shown)),
            None => format!("<span>{}</span>", escape(&a.shown)),
        })
        .collect::<Vec<_>>()
        .join(", ");
    let limited = if iface.limited {
        "<div class=\"small text-warning\">Limited data: run with elevated privileges for full statistics</div>"
    } else {
        ""
    };
    format!(
        "<div class=\"interface\"><h6>{} <span class=\"text-muted\">{}</span></h6><div class=\"small\">MAC: {} | Speed: {}</div><div class=\"small\">IPv4: {}</div><div class=\"small\">IPv6: {}</div><div class=\"small\">Download: {} | Upload: {}</div><div class=\"small\">Received: {} ({} packets, avg {} B) | Sent: {} ({} packets, avg {} B)</div>{}</div>",
        escape(&iface.name),
        escape(&iface.display_name),
        escape(&iface.mac_address),
        escape(&iface.speed),
        escape(&iface.ipv4.join(", ")),
        if ipv6.is_empty() { "N/A".to_string() } else { ipv6 },
        escape(&iface.download_rate),
        escape(&iface.upload_rate),
        escape(&iface.received),
        iface.packets_recv,
        iface.avg_recv_packet,
        escape(&iface.sent),
        iface.packets_sent,
        iface.avg_sent_packet,
        limited
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Board;
    use serde_json::json;

    #[test]
    fn average_packet_size_handles_zero_packets() {
        assert_eq!(avg_packet_size(1_000, 0), 0);
        assert_eq!(avg_packet_size(1_000, 3), 333);
        assert_eq!(avg_packet_size(1_000, 6), 167);
    }

    #[test]
    fn header_shows_only_present_pieces() {
        let view = NetworkPanel
            .map(&json!({ "hostname": "box", "domain": "Unknown", "ipv4DefaultGateway": "10.0.0.1" }))
            .unwrap();
        assert_eq!(view.header, "box | Gateway: 10.0.0.1");

        let view = NetworkPanel.map(&json!({ "hostname": "box" })).unwrap();
        assert_eq!(view.header, "box");
    }

    #[test]
    fn tcp_fields_default_to_zero() {
        let view = NetworkPanel
            .map(&json!({ "tcp": { "connectionsActive": 5 }, "udp": {} }))
            .unwrap();
        let tcp = view.tcp.expect("tcp block");
        assert_eq!(tcp[0], ("Active connections", 5));
        assert!(tcp[1..].iter().all(|(_, v)| *v == 0));
        assert!(view.udp.expect("udp block").iter().all(|(_, v)| *v == 0));
    }

    #[test]
    fn filters_to_connected_ipv4_interfaces() {
        let view = NetworkPanel
            .map(&json!({ "interfaces": [
                { "name": "lo0", "connected": false, "ipv4Addresses": ["127.0.0.1"] },
                { "name": "utun0", "connected": true, "ipv4Addresses": [] },
                { "name": "en0", "connected": true, "ipv4Addresses": ["192.168.1.5"],
                  "ipv6Addresses": ["fe80::1c2d:3e4f:5a6b:7c8d%en0"],
                  "packetsRecv": 0, "bytesRecv": 0, "packetsSent": 10, "bytesSent": 15000 }
            ]}))
            .unwrap();
        let Interfaces::Active(list) = &view.interfaces else {
            panic!("expected active interfaces");
        };
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "en0");
        assert_eq!(list[0].avg_recv_packet, 0);
        assert_eq!(list[0].avg_sent_packet, 1500);
        assert_eq!(list[0].ipv6[0].shown, "fe80::1c2d:3e4f:5a6b...");
        assert_eq!(
            list[0].ipv6[0].full.as_deref(),
            Some("fe80::1c2d:3e4f:5a6b:7c8d%en0")
        );
    }

    #[test]
    fn distinguishes_no_interfaces_from_no_active() {
        let none = NetworkPanel.map(&json!({ "interfaces": [] })).unwrap();
        assert_eq!(none.interfaces, Interfaces::NoneFound);

        let inactive = NetworkPanel
            .map(&json!({ "interfaces": [{ "name": "en1", "connected": false }] }))
            .unwrap();
        assert_eq!(inactive.interfaces, Interfaces::NoneActive);

        let mut board = Board::new();
        NetworkPanel.render(&inactive, &mut board);
        let html = board.content(SurfaceId::Network);
        assert!(html.contains(NO_ACTIVE_INTERFACES));
        assert!(!html.contains(NO_INTERFACES));
    }

    #[test]
    fn short_ipv6_is_not_truncated() {
        let addr = display_ipv6("fe80::1");
        assert_eq!(addr.shown, "fe80::1");
        assert!(addr.full.is_none());
    }
}
