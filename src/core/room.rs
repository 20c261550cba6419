use std::collections::HashSet;

/// Identifier of a connected client
pub type ClientId = String;

/// Name of a room
pub type RoomName = String;

/// A counted set of client IDs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Room {
    /// Set of client IDs currently in the room
    members: HashSet<ClientId>,
    /// Cardinality of `members`, maintained on every actual change
    count: usize,
}

impl Room {
    /// Creates an empty room
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member to the room, returns whether it was newly inserted
    pub fn add(&mut self, client_id: &str) -> bool {
        if self.members.insert(client_id.to_string()) {
            self.count += 1;
            true
        } else {
            false
        }
    }

    /// Removes a member from the room, returns whether it was present
    pub fn remove(&mut self, client_id: &str) -> bool {
        if self.members.remove(client_id) {
            self.count -= 1;
            true
        } else {
            false
        }
    }

    /// Checks if a client is a member of the room
    pub fn contains(&self, client_id: &str) -> bool {
        self.members.contains(client_id)
    }

    /// Returns the number of members in the room
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn members(&self) -> impl Iterator<Item = &ClientId> {
        self.members.iter()
    }
}
