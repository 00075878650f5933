use std::net::{IpAddr, Ipv4Addr};

use crate::hostfs::HostPathResolver;
use crate::nsexec::HostCommandRunner;

use super::filter;

/// Sentinel reported when no strategy and no local fallback yields an
/// address.
pub const UNAVAILABLE: &str = "unavailable";

/// Infers the host's externally-meaningful IPv4 address.
///
/// Six named strategies are evaluated in order by a first-success combinator;
/// every candidate passes the shared exclusion filter, so the resolver can
/// never report a loopback or container-bridge address. Strategy order runs
/// from the most authoritative source (asking the host itself via namespace
/// entry) down to heuristic scans of kernel routing state.
pub struct AddressResolver<'a> {
    paths: &'a HostPathResolver,
    runner: &'a dyn HostCommandRunner,
}

impl<'a> AddressResolver<'a> {
    pub fn new(paths: &'a HostPathResolver, runner: &'a dyn HostCommandRunner) -> Self {
        Self { paths, runner }
    }

    /// Runs the full cascade. Returns `None` only if every strategy fails.
    pub fn resolve(&self) -> Option<Ipv4Addr> {
        let strategies: &[(&'static str, fn(&Self) -> Option<Ipv4Addr>)] = &[
            ("hostname-query", Self::from_hostname_query),
            ("interface-listing", Self::from_interface_listing),
            ("device-enumeration", Self::from_device_enumeration),
            ("fib-trie", Self::from_fib_trie),
            ("route-table", Self::from_route_table),
            ("neighbor-table", Self::from_neighbor_table),
        ];

        for (name, strategy) in strategies {
            if let Some(addr) = strategy(self) {
                log::debug!("host address {addr} resolved via `{name}` strategy");
                return Some(addr);
            }
            log::debug!("address strategy `{name}` yielded no candidate");
        }
        None
    }

    /// Strategy 1: ask the host for its own addresses (`hostname -I`) inside
    /// its namespaces.
    fn from_hostname_query(&self) -> Option<Ipv4Addr> {
        let output = self.runner.run("hostname -I")?;
        filter::scan_ipv4_tokens(&output).find(|addr| !filter::is_excluded(*addr))
    }

    /// Strategy 2: list host interfaces (`ip -4 addr show`) inside its
    /// namespaces and take the first acceptable `inet` address.
    fn from_interface_listing(&self) -> Option<Ipv4Addr> {
        let output = self.runner.run("ip -4 addr show")?;
        output
            .lines()
            .filter_map(|line| {
                let rest = line.trim_start().strip_prefix("inet ")?;
                let token = rest.split_whitespace().next()?;
                token.split('/').next()?.parse::<Ipv4Addr>().ok()
            })
            .find(|addr| !filter::is_excluded(*addr))
    }

    /// Strategy 3: enumerate host network devices (skipping loopback) and
    /// cross-reference the neighbor table for an address on one of them.
    /// Best-effort: without namespace entry the device list alone carries no
    /// addresses.
    fn from_device_enumeration(&self) -> Option<Ipv4Addr> {
        let net_dir = self.paths.locate("/sys/class/net");
        let devices: Vec<String> = std::fs::read_dir(net_dir)
            .ok()?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name != "lo")
            .collect();
        if devices.is_empty() {
            return None;
        }

        let arp = self.paths.read("/proc/net/arp")?;
        let candidates: Vec<Ipv4Addr> = parse_neighbor_entries(&arp)
            .filter(|(addr, device)| {
                devices.iter().any(|known| known == device) && !filter::is_excluded(*addr)
            })
            .map(|(addr, _)| addr)
            .collect();
        filter::prefer_private(&candidates)
    }

    /// Strategy 4: scan the kernel's IPv4 forwarding-information trie for
    /// dotted-quad tokens, preferring private-range matches.
    fn from_fib_trie(&self) -> Option<Ipv4Addr> {
        let trie = self.paths.read("/proc/net/fib_trie")?;
        // Trie entries include network prefixes (192.168.0.0/24); a zero host
        // octet marks those, not an assigned address.
        let candidates: Vec<Ipv4Addr> = filter::scan_ipv4_tokens(&trie)
            .filter(|addr| !filter::is_excluded(*addr) && addr.octets()[3] != 0)
            .collect();
        filter::prefer_private(&candidates)
    }

    /// Strategy 5: find the default-route interface in the kernel routing
    /// table, then return the neighbor-table address on that interface. As a
    /// last resort scan the route line's raw hex fields for a plausible
    /// address, skipping the subnet-mask column and rejecting mask-shaped
    /// values.
    fn from_route_table(&self) -> Option<Ipv4Addr> {
        let route = self.paths.read("/proc/net/route")?;
        let default_line = route
            .lines()
            .skip(1)
            .find(|line| line.split_whitespace().nth(1) == Some("00000000"))?;
        let iface = default_line.split_whitespace().next()?;

        if let Some(arp) = self.paths.read("/proc/net/arp") {
            let matched = parse_neighbor_entries(&arp)
                .find(|(addr, device)| device == iface && !filter::is_excluded(*addr));
            if let Some((addr, _)) = matched {
                return Some(addr);
            }
        }

        scan_route_fields(default_line)
    }

    /// Strategy 6: read the neighbor-resolution table directly, collecting
    /// every acceptable address and preferring private ranges.
    fn from_neighbor_table(&self) -> Option<Ipv4Addr> {
        let arp = self.paths.read("/proc/net/arp")?;
        let candidates: Vec<Ipv4Addr> = parse_neighbor_entries(&arp)
            .map(|(addr, _)| addr)
            .filter(|addr| !filter::is_excluded(*addr))
            .collect();
        filter::prefer_private(&candidates)
    }
}

/// Parses `/proc/net/arp` content into `(address, device)` pairs, skipping
/// the header line and malformed rows.
fn parse_neighbor_entries(arp: &str) -> impl Iterator<Item = (Ipv4Addr, String)> + '_ {
    arp.lines().skip(1).filter_map(|line| {
        let mut fields = line.split_whitespace();
        let addr = fields.next()?.parse::<Ipv4Addr>().ok()?;
        let device = fields.last()?;
        Some((addr, device.to_owned()))
    })
}

// Column 7 of /proc/net/route is the subnet mask; an address-shaped value
// there must not be mistaken for a host address.
const ROUTE_MASK_COLUMN: usize = 7;

/// Scans the hex fields of a routing-table line for a plausible host
/// address. Fields are 8-digit little-endian hex words.
fn scan_route_fields(line: &str) -> Option<Ipv4Addr> {
    line.split_whitespace()
        .enumerate()
        .filter(|(idx, field)| *idx != ROUTE_MASK_COLUMN && field.len() == 8)
        .filter_map(|(_, field)| parse_route_hex(field))
        .find(|addr| !filter::is_excluded(*addr) && !filter::is_subnet_mask(*addr))
}

/// Parses one little-endian hex word (e.g. `0100A8C0` for `192.168.0.1`).
fn parse_route_hex(field: &str) -> Option<Ipv4Addr> {
    let value = u32::from_str_radix(field, 16).ok()?;
    Some(Ipv4Addr::from(value.swap_bytes()))
}

/// Container-local final fallback: the first non-internal IPv4 address of the
/// container's own interfaces, still subject to the exclusion filter.
pub fn local_interface_address() -> Option<Ipv4Addr> {
    let networks = sysinfo::Networks::new_with_refreshed_list();
    for (name, data) in networks.iter() {
        if name == "lo" {
            continue;
        }
        for network in data.ip_networks() {
            if let IpAddr::V4(addr) = network.addr
                && !filter::is_excluded(addr)
            {
                return Some(addr);
            }
        }
    }
    None
}

/// Resolves the host address through the full cascade and the local
/// fallback, returning the sentinel [`UNAVAILABLE`] when nothing acceptable
/// exists.
pub fn resolve_host_address(paths: &HostPathResolver, runner: &dyn HostCommandRunner) -> String {
    AddressResolver::new(paths, runner)
        .resolve()
        .or_else(local_interface_address)
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| UNAVAILABLE.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nsexec::testing::{FakeRunner, UnavailableRunner};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const ARP_HEADER: &str =
        "IP address       HW type     Flags       HW address            Mask     Device";
    const ROUTE_HEADER: &str =
        "Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT";

    fn write_under(root: &Path, logical: &str, content: &str) {
        let path = root.join(logical.trim_start_matches('/'));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Synthetic escape and container roots, fully isolated from the test
    /// machine's real `/proc` and `/sys`. The host-root tier stays empty so
    /// reads resolve through tier 1 only.
    fn synthetic_roots() -> (TempDir, TempDir) {
        (TempDir::new().unwrap(), TempDir::new().unwrap())
    }

    fn resolver_for(escape: &TempDir, container: &TempDir) -> HostPathResolver {
        HostPathResolver::with_container_root(
            escape.path(),
            "/nonexistent-host-root",
            container.path(),
        )
    }

    fn ip(s: &str) -> Ipv4Addr {
        s.parse().unwrap()
    }

    #[test]
    fn test_hostname_query_takes_first_acceptable() {
        let (escape, container) = synthetic_roots();
        let paths = resolver_for(&escape, &container);
        let runner = FakeRunner::default().with("hostname -I", "127.0.0.1 172.17.0.2 192.168.0.7");

        let resolver = AddressResolver::new(&paths, &runner);
        assert_eq!(resolver.resolve(), Some(ip("192.168.0.7")));
    }

    #[test]
    fn test_interface_listing_skips_loopback() {
        let (escape, container) = synthetic_roots();
        let paths = resolver_for(&escape, &container);
        let runner = FakeRunner::default().with(
            "ip -4 addr show",
            "1: lo: <LOOPBACK,UP>\n    inet 127.0.0.1/8 scope host lo\n\
             2: eth0: <BROADCAST,UP>\n    inet 10.0.1.4/24 brd 10.0.1.255 scope global eth0\n",
        );

        let resolver = AddressResolver::new(&paths, &runner);
        assert_eq!(resolver.resolve(), Some(ip("10.0.1.4")));
    }

    #[test]
    fn test_device_enumeration_cross_references_neighbors() {
        let (escape, container) = synthetic_roots();
        fs::create_dir_all(escape.path().join("sys/class/net/lo")).unwrap();
        fs::create_dir_all(escape.path().join("sys/class/net/enp3s0")).unwrap();
        write_under(
            escape.path(),
            "/proc/net/arp",
            &format!(
                "{ARP_HEADER}\n\
                 172.17.0.3       0x1         0x2         02:42:ac:11:00:03     *        docker0\n\
                 192.168.0.19     0x1         0x2         aa:bb:cc:dd:ee:ff     *        enp3s0\n"
            ),
        );

        let paths = resolver_for(&escape, &container);
        let resolver = AddressResolver::new(&paths, &UnavailableRunner);
        assert_eq!(resolver.resolve(), Some(ip("192.168.0.19")));
    }

    #[test]
    fn test_fib_trie_prefers_private_range() {
        let (escape, container) = synthetic_roots();
        write_under(
            escape.path(),
            "/proc/net/fib_trie",
            "Main:\n  +-- 0.0.0.0/0 3 0 5\n     |-- 0.0.0.0\n        /0 universe UNICAST\n\
               +-- 203.0.113.0/24 2 0 2\n     |-- 203.0.113.7\n\
               +-- 192.168.0.0/24 2 0 2\n     |-- 192.168.0.19\n        /32 host LOCAL\n",
        );

        let paths = resolver_for(&escape, &container);
        let resolver = AddressResolver::new(&paths, &UnavailableRunner);
        assert_eq!(resolver.resolve(), Some(ip("192.168.0.19")));
    }

    #[test]
    fn test_route_table_matches_neighbor_on_default_iface() {
        let (escape, container) = synthetic_roots();
        write_under(
            escape.path(),
            "/proc/net/route",
            &format!(
                "{ROUTE_HEADER}\n\
                 eth0\t00000000\t0100A8C0\t0003\t0\t0\t0\t00000000\t0\t0\t0\n"
            ),
        );
        write_under(
            escape.path(),
            "/proc/net/arp",
            &format!(
                "{ARP_HEADER}\n\
                 192.168.0.19     0x1         0x2         aa:bb:cc:dd:ee:ff     *        eth0\n"
            ),
        );

        let paths = resolver_for(&escape, &container);
        let resolver = AddressResolver::new(&paths, &UnavailableRunner);
        assert_eq!(resolver.resolve(), Some(ip("192.168.0.19")));
    }

    #[test]
    fn test_route_table_hex_scan_skips_mask_column() {
        let (escape, container) = synthetic_roots();
        // No ARP table: the strategy must fall back to the raw hex fields and
        // pick the gateway word, not the 255.255.255.0 mask.
        write_under(
            escape.path(),
            "/proc/net/route",
            &format!(
                "{ROUTE_HEADER}\n\
                 eth0\t00000000\t0100A8C0\t0003\t0\t0\t0\t00FFFFFF\t0\t0\t0\n"
            ),
        );

        let paths = resolver_for(&escape, &container);
        let resolver = AddressResolver::new(&paths, &UnavailableRunner);
        assert_eq!(resolver.resolve(), Some(ip("192.168.0.1")));
    }

    #[test]
    fn test_neighbor_table_direct() {
        let (escape, container) = synthetic_roots();
        write_under(
            escape.path(),
            "/proc/net/arp",
            &format!(
                "{ARP_HEADER}\n\
                 203.0.113.9      0x1         0x2         aa:aa:aa:aa:aa:aa     *        eth1\n\
                 10.0.0.23        0x1         0x2         bb:bb:bb:bb:bb:bb     *        eth0\n"
            ),
        );

        let paths = resolver_for(&escape, &container);
        let resolver = AddressResolver::new(&paths, &UnavailableRunner);
        assert_eq!(resolver.resolve(), Some(ip("10.0.0.23")));
    }

    #[test]
    fn test_each_disabled_strategy_falls_through_to_next() {
        let (escape, container) = synthetic_roots();
        // All six sources present, then removed front to back; the resolver
        // must hand over to the next strategy each time.
        fs::create_dir_all(escape.path().join("sys/class/net/eth0")).unwrap();
        write_under(
            escape.path(),
            "/proc/net/arp",
            &format!(
                "{ARP_HEADER}\n\
                 10.0.0.3         0x1         0x2         cc:cc:cc:cc:cc:cc     *        eth0\n"
            ),
        );
        write_under(
            escape.path(),
            "/proc/net/fib_trie",
            "  |-- 10.0.0.4\n        /32 host LOCAL\n",
        );
        write_under(
            escape.path(),
            "/proc/net/route",
            &format!(
                "{ROUTE_HEADER}\n\
                 eth0\t00000000\t0500000A\t0003\t0\t0\t0\t00FFFFFF\t0\t0\t0\n"
            ),
        );
        let paths = resolver_for(&escape, &container);

        let full = FakeRunner::default()
            .with("hostname -I", "10.0.0.1")
            .with("ip -4 addr show", "    inet 10.0.0.2/24 scope global eth0");
        assert_eq!(
            AddressResolver::new(&paths, &full).resolve(),
            Some(ip("10.0.0.1"))
        );

        let no_hostname =
            FakeRunner::default().with("ip -4 addr show", "    inet 10.0.0.2/24 scope global eth0");
        assert_eq!(
            AddressResolver::new(&paths, &no_hostname).resolve(),
            Some(ip("10.0.0.2"))
        );

        // No namespace entry at all: device enumeration wins.
        assert_eq!(
            AddressResolver::new(&paths, &UnavailableRunner).resolve(),
            Some(ip("10.0.0.3"))
        );

        // Remove the device entries: fib trie wins.
        fs::remove_dir_all(escape.path().join("sys/class/net")).unwrap();
        assert_eq!(
            AddressResolver::new(&paths, &UnavailableRunner).resolve(),
            Some(ip("10.0.0.4"))
        );

        // Remove the trie: the route table's default iface matches the
        // neighbor entry.
        fs::remove_file(escape.path().join("proc/net/fib_trie")).unwrap();
        assert_eq!(
            AddressResolver::new(&paths, &UnavailableRunner).resolve(),
            Some(ip("10.0.0.3"))
        );

        // Remove the ARP table: the route strategy falls back to its raw hex
        // fields and picks the gateway word.
        fs::remove_file(escape.path().join("proc/net/arp")).unwrap();
        assert_eq!(
            AddressResolver::new(&paths, &UnavailableRunner).resolve(),
            Some(ip("10.0.0.5"))
        );

        // Remove the route table too: nothing left.
        fs::remove_file(escape.path().join("proc/net/route")).unwrap();
        assert_eq!(AddressResolver::new(&paths, &UnavailableRunner).resolve(), None);
    }

    #[test]
    fn test_resolver_never_reports_excluded_addresses() {
        let (escape, container) = synthetic_roots();
        write_under(
            escape.path(),
            "/proc/net/fib_trie",
            "  |-- 127.0.0.1\n  |-- 172.17.0.2\n  |-- 0.0.0.0\n  |-- 255.255.255.255\n",
        );
        write_under(
            escape.path(),
            "/proc/net/arp",
            &format!(
                "{ARP_HEADER}\n\
                 172.18.0.5       0x1         0x2         dd:dd:dd:dd:dd:dd     *        docker0\n"
            ),
        );
        let paths = resolver_for(&escape, &container);
        let runner = FakeRunner::default()
            .with("hostname -I", "127.0.0.1 172.17.0.2")
            .with("ip -4 addr show", "    inet 127.0.0.1/8 scope host lo");

        assert_eq!(AddressResolver::new(&paths, &runner).resolve(), None);
    }

    #[test]
    fn test_sentinel_when_everything_fails() {
        let (escape, container) = synthetic_roots();
        let paths = resolver_for(&escape, &container);
        let resolved = resolve_host_address(&paths, &UnavailableRunner);
        // Depending on the test host's interfaces the local fallback may
        // produce a real address; it must never produce an excluded one.
        if resolved != UNAVAILABLE {
            let addr: Ipv4Addr = resolved.parse().unwrap();
            assert!(!filter::is_excluded(addr));
        }
    }

    #[test]
    fn test_parse_route_hex_little_endian() {
        assert_eq!(parse_route_hex("0100A8C0"), Some(ip("192.168.0.1")));
        assert_eq!(parse_route_hex("00000000"), Some(ip("0.0.0.0")));
        assert_eq!(parse_route_hex("xyz"), None);
    }
}
