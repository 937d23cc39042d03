//! Anel de hashing consistente com nós virtuais sobre a [`AvlTree`].

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use memvault_common::RoutingError;

use crate::avl::AvlTree;
use crate::hash::ring_position;

/// Endereço de um nó físico. `localhost` é normalizado para `127.0.0.1`,
/// de modo que o mesmo nó sempre ocupa as mesmas posições.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeAddr {
    host: String,
    port: u16,
}

impl NodeAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        let host = if host.eq_ignore_ascii_case("localhost") {
            "127.0.0.1".to_string()
        } else {
            host
        };
        Self { host, port }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Identificador do i-ésimo nó virtual: `host:port-i`.
    pub fn vnode_id(&self, index: usize) -> String {
        format!("{}:{}-{}", self.host, self.port, index)
    }
}

impl fmt::Display for NodeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseNodeAddrError {
    #[error("endereço sem porta: {0:?} (esperado host:port)")]
    MissingPort(String),
    #[error("porta inválida em {0:?}")]
    InvalidPort(String),
}

impl FromStr for NodeAddr {
    type Err = ParseNodeAddrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .filter(|(host, _)| !host.is_empty())
            .ok_or_else(|| ParseNodeAddrError::MissingPort(s.to_string()))?;
        let port = port
            .parse()
            .map_err(|_| ParseNodeAddrError::InvalidPort(s.to_string()))?;
        Ok(Self::new(host, port))
    }
}

/// Uma posição ocupada no anel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingEntry {
    pub position: u32,
    pub node: NodeAddr,
    pub virtual_index: usize,
}

/// Líder e réplicas escolhidos para uma chave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub position: u32,
    pub leader: NodeAddr,
    pub replicas: Vec<NodeAddr>,
}

#[derive(Debug, Default, Clone)]
pub struct HashRing {
    tree: AvlTree<RingEntry>,
}

impl HashRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Número de posições (nós virtuais) ocupadas.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Insere uma entrada na sua posição, sobrescrevendo quem estivesse lá.
    pub fn insert_entry(&mut self, entry: RingEntry) -> Option<RingEntry> {
        self.tree.insert(entry.position, entry)
    }

    /// Registra `vnodes` posições para o nó e retorna as posições ocupadas.
    pub fn add_node(&mut self, node: &NodeAddr, vnodes: usize) -> Vec<u32> {
        (0..vnodes)
            .map(|virtual_index| {
                let position = ring_position(&node.vnode_id(virtual_index));
                self.insert_entry(RingEntry {
                    position,
                    node: node.clone(),
                    virtual_index,
                });
                position
            })
            .collect()
    }

    /// Remove as posições que ainda pertencem ao nó. Posições sobrescritas
    /// por outro nó numa colisão ficam intactas.
    pub fn remove_node(&mut self, node: &NodeAddr) -> usize {
        let owned: Vec<u32> = self
            .tree
            .iter()
            .filter(|(_, entry)| &entry.node == node)
            .map(|(position, _)| position)
            .collect();
        for &position in &owned {
            self.tree.remove(position);
        }
        owned.len()
    }

    pub fn contains_node(&self, node: &NodeAddr) -> bool {
        self.tree.iter().any(|(_, entry)| &entry.node == node)
    }

    /// Nós físicos distintos, em ordem de endereço.
    pub fn nodes(&self) -> Vec<NodeAddr> {
        self.tree
            .iter()
            .map(|(_, entry)| entry.node.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Dono de uma posição: menor posição `>=`, com wraparound para a menor.
    pub fn owner_of_position(&self, position: u32) -> Result<&RingEntry, RoutingError> {
        if self.tree.is_empty() {
            return Err(RoutingError::NoNodesConnected);
        }
        self.tree
            .ceiling(position)
            .or_else(|| self.tree.first())
            .map(|(_, entry)| entry)
            .ok_or(RoutingError::NoOwner(position))
    }

    pub fn route(&self, key: &str) -> Result<&RingEntry, RoutingError> {
        self.owner_of_position(ring_position(key))
    }

    /// Até `count` nós físicos distintos do líder, caminhando sucessores a
    /// partir da posição do líder. Para após uma volta completa.
    pub fn replicas(&self, leader: &RingEntry, count: usize) -> Vec<NodeAddr> {
        let mut replicas = Vec::new();
        if count == 0 {
            return replicas;
        }

        let mut seen = HashSet::from([&leader.node]);
        let mut cursor = leader.position;
        for _ in 0..self.tree.len() {
            let Some((position, entry)) = self
                .tree
                .successor(cursor)
                .or_else(|| self.tree.first())
            else {
                break;
            };
            if position == leader.position {
                break;
            }
            if seen.insert(&entry.node) {
                replicas.push(entry.node.clone());
                if replicas.len() == count {
                    break;
                }
            }
            cursor = position;
        }
        replicas
    }

    /// Líder e `replication_factor - 1` réplicas para a chave.
    pub fn placement(&self, key: &str, replication_factor: usize) -> Result<Placement, RoutingError> {
        let leader = self.route(key)?;
        let replicas = self.replicas(leader, replication_factor.saturating_sub(1));
        Ok(Placement {
            position: leader.position,
            leader: leader.node.clone(),
            replicas,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(position: u32, node: &NodeAddr) -> RingEntry {
        RingEntry {
            position,
            node: node.clone(),
            virtual_index: 0,
        }
    }

    fn addr(port: u16) -> NodeAddr {
        NodeAddr::new("127.0.0.1", port)
    }

    /// Anel com posições 100 (A), 200 (B), 300 (C).
    fn three_node_ring() -> HashRing {
        let mut ring = HashRing::new();
        ring.insert_entry(entry(100, &addr(1)));
        ring.insert_entry(entry(200, &addr(2)));
        ring.insert_entry(entry(300, &addr(3)));
        ring
    }

    #[test]
    fn localhost_is_normalized() {
        assert_eq!(NodeAddr::new("localhost", 6379), addr(6379));
        assert_eq!(NodeAddr::new("LOCALHOST", 1).to_string(), "127.0.0.1:1");
    }

    #[test]
    fn vnode_ids_follow_host_port_index() {
        assert_eq!(addr(6379).vnode_id(7), "127.0.0.1:6379-7");
    }

    #[test]
    fn parse_node_addr() {
        assert_eq!("localhost:7000".parse::<NodeAddr>(), Ok(addr(7000)));
        assert_eq!(
            "10.0.0.1:80".parse::<NodeAddr>().map(|a| a.to_string()),
            Ok("10.0.0.1:80".to_string())
        );
        assert!(matches!(
            "no-port".parse::<NodeAddr>(),
            Err(ParseNodeAddrError::MissingPort(_))
        ));
        assert!(matches!(
            ":80".parse::<NodeAddr>(),
            Err(ParseNodeAddrError::MissingPort(_))
        ));
        assert!(matches!(
            "host:99999".parse::<NodeAddr>(),
            Err(ParseNodeAddrError::InvalidPort(_))
        ));
    }

    #[test]
    fn empty_ring_reports_no_nodes() {
        let ring = HashRing::new();
        assert_eq!(ring.route("k"), Err(RoutingError::NoNodesConnected));
        assert_eq!(ring.placement("k", 3), Err(RoutingError::NoNodesConnected));
    }

    #[test]
    fn owner_is_ceiling_with_wraparound() {
        let ring = three_node_ring();
        assert_eq!(ring.owner_of_position(150).map(|e| e.position), Ok(200));
        assert_eq!(ring.owner_of_position(200).map(|e| e.position), Ok(200));
        assert_eq!(ring.owner_of_position(50).map(|e| e.position), Ok(100));
        assert_eq!(ring.owner_of_position(350).map(|e| e.position), Ok(100));
    }

    #[test]
    fn replicas_walk_successors_and_wrap() {
        let ring = three_node_ring();
        let leader = ring.owner_of_position(250).unwrap();
        assert_eq!(leader.node, addr(3));
        assert_eq!(ring.replicas(leader, 2), vec![addr(1), addr(2)]);
        assert_eq!(ring.replicas(leader, 1), vec![addr(1)]);
        assert!(ring.replicas(leader, 0).is_empty());
    }

    #[test]
    fn replicas_skip_vnodes_of_same_physical_node() {
        let mut ring = HashRing::new();
        let a = addr(1);
        let b = addr(2);
        ring.insert_entry(entry(10, &a));
        ring.insert_entry(entry(20, &a));
        ring.insert_entry(entry(30, &a));
        ring.insert_entry(entry(40, &b));
        ring.insert_entry(entry(50, &a));

        let leader = ring.owner_of_position(5).unwrap().clone();
        assert_eq!(leader.node, a);
        assert_eq!(ring.replicas(&leader, 2), vec![b]);
    }

    #[test]
    fn replicas_stop_after_full_lap() {
        let mut ring = HashRing::new();
        let only = addr(1);
        ring.add_node(&only, 50);
        let placement = ring.placement("any-key", 3).unwrap();
        assert_eq!(placement.leader, only);
        assert!(placement.replicas.is_empty());
    }

    #[test]
    fn placement_never_repeats_physical_nodes() {
        let mut ring = HashRing::new();
        for port in 7000..7005 {
            ring.add_node(&addr(port), 100);
        }
        for i in 0..500 {
            let key = format!("user:{i}");
            let placement = ring.placement(&key, 3).unwrap();
            assert_eq!(placement.replicas.len(), 2);
            let mut all = placement.replicas.clone();
            all.push(placement.leader.clone());
            let distinct: HashSet<_> = all.iter().collect();
            assert_eq!(distinct.len(), 3, "key {key}");
        }
    }

    #[test]
    fn add_node_is_deterministic_and_idempotent() {
        let mut ring = HashRing::new();
        let node = addr(6379);
        let first = ring.add_node(&node, 100);
        let len = ring.len();
        let second = ring.add_node(&node, 100);
        assert_eq!(first, second);
        assert_eq!(ring.len(), len);
        assert!(len <= 100);
    }

    #[test]
    fn routing_is_stable_for_same_ring() {
        let mut ring = HashRing::new();
        ring.add_node(&addr(1), 100);
        ring.add_node(&addr(2), 100);
        let owner = ring.route("session:42").unwrap().node.clone();
        for _ in 0..10 {
            assert_eq!(ring.route("session:42").unwrap().node, owner);
        }
    }

    #[test]
    fn remove_node_keeps_other_owners() {
        let mut ring = three_node_ring();
        // B sobrescreve a posição 100 de A.
        ring.insert_entry(entry(100, &addr(2)));
        assert_eq!(ring.remove_node(&addr(1)), 0);
        assert_eq!(ring.remove_node(&addr(2)), 2);
        assert_eq!(ring.nodes(), vec![addr(3)]);
        assert!(!ring.contains_node(&addr(2)));
    }

    #[test]
    fn removing_all_nodes_empties_ring() {
        let mut ring = HashRing::new();
        ring.add_node(&addr(1), 10);
        ring.add_node(&addr(2), 10);
        ring.remove_node(&addr(1));
        ring.remove_node(&addr(2));
        assert!(ring.is_empty());
        assert_eq!(ring.route("k"), Err(RoutingError::NoNodesConnected));
    }

    #[test]
    fn vnodes_spread_load() {
        let mut ring = HashRing::new();
        let nodes: Vec<NodeAddr> = (7000..7003).map(addr).collect();
        for node in &nodes {
            ring.add_node(node, 100);
        }
        let mut counts = std::collections::HashMap::new();
        for i in 0..3_000 {
            let owner = ring.route(&format!("key:{i}")).unwrap().node.clone();
            *counts.entry(owner).or_insert(0usize) += 1;
        }
        assert_eq!(counts.len(), 3);
        assert!(counts.values().all(|&c| c > 500), "{counts:?}");
    }
}
