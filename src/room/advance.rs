use crate::room::client_id::ClientId;
use std::collections::BTreeSet;

/// Which connections have signalled "ready to advance" since the last
/// current-item change. Cleared on every change of the selection.
#[derive(Debug, Default)]
pub struct AdvanceVotes {
	voted: BTreeSet<ClientId>,
}

impl AdvanceVotes {
	pub fn record(&mut self, client_id: ClientId) {
		self.voted.insert(client_id);
	}

	pub fn clear(&mut self) {
		self.voted.clear();
	}

	/// Consensus is a set difference, not a count: clients may have voted and
	/// left in the meantime, and fresh connections must be waited for. An
	/// empty room never reaches consensus.
	pub fn everyone_voted(&self, live: &BTreeSet<ClientId>) -> bool {
		!live.is_empty() && live.difference(&self.voted).next().is_none()
	}
}
