use crate::common::PeerId;

/// The routing table this crate maintains membership of.
///
/// Bucket placement and refresh scheduling stay with the implementation, every
/// operation here must be idempotent.
pub trait RoutingTable: Send {
    /// Attempt to admit `peer`. Returns `true` if it was added.
    ///
    /// `query_peer` is `true` when the peer was discovered through a successful query.
    fn peer_found(&mut self, peer: PeerId, query_peer: bool) -> bool;

    /// Schedule a refresh if the table is degraded.
    fn fix_if_needed(&mut self);

    fn remove_peer(&mut self, peer: &PeerId);

    fn contains(&self, peer: &PeerId) -> bool;

    fn size(&self) -> usize;
}
