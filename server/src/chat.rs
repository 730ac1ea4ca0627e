//! Chat channels (§4.2 `ChatEvent`, §7 "chat fan-out is independent of any
//! game").
//!
//! Chat has no `game_id` to key events by, so it deliberately sits outside
//! the `CommandContainer` three-lane system: a channel just holds its
//! members' senders directly and pushes `Event`s to each of them, the same
//! shallow fan-out the teacher's lobby broadcast does for its single global
//! room.

use std::collections::HashMap;

use protocol::{Event, ServerInfoChatChannel, ServerInfoChatUser};
use tokio::sync::mpsc;

use crate::registry::ConnectionId;

struct Member {
    player_name: String,
    sender: mpsc::Sender<protocol::Item>,
}

pub struct ChatChannel {
    pub name: String,
    pub description: String,
    pub auto_join: bool,
    members: HashMap<ConnectionId, Member>,
}

impl ChatChannel {
    pub fn new(name: impl Into<String>, description: impl Into<String>, auto_join: bool) -> Self {
        ChatChannel {
            name: name.into(),
            description: description.into(),
            auto_join,
            members: HashMap::new(),
        }
    }

    pub fn to_server_info(&self) -> ServerInfoChatChannel {
        ServerInfoChatChannel {
            name: self.name.clone(),
            description: self.description.clone(),
            user_count: self.members.len() as i32,
            auto_join: self.auto_join,
        }
    }

    pub fn users(&self) -> Vec<ServerInfoChatUser> {
        self.members.values().map(|m| ServerInfoChatUser { name: m.player_name.clone() }).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Adds `connection_id` as a member and announces it to everyone already
    /// present. The joiner itself learns the current roster separately — the
    /// caller sends it an `Event::ChatListPlayers` built from [`Self::users`]
    /// after this returns.
    pub fn join(&mut self, connection_id: ConnectionId, player_name: String, sender: mpsc::Sender<protocol::Item>) {
        self.broadcast(&Event::ChatJoinChannel {
            channel: self.to_server_info(),
            user: ServerInfoChatUser { name: player_name.clone() },
        });
        self.members.insert(connection_id, Member { player_name, sender });
    }

    pub fn leave(&mut self, connection_id: ConnectionId) {
        if let Some(member) = self.members.remove(&connection_id) {
            self.broadcast(&Event::ChatLeaveChannel {
                channel: self.name.clone(),
                user: ServerInfoChatUser { name: member.player_name },
            });
        }
    }

    pub fn say(&mut self, from: &str, message: &str) {
        self.broadcast(&Event::ChatSay {
            channel: self.name.clone(),
            user: ServerInfoChatUser { name: from.to_string() },
            message: message.to_string(),
        });
    }

    fn broadcast(&self, event: &Event) {
        let item = event.to_item();
        for member in self.members.values() {
            // A full or closed mailbox means the connection is on its way
            // out; its own disconnect cleanup will drop it from every
            // channel shortly, so a dropped send here is not an error.
            let _ = member.sender.try_send(item.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_announces_to_existing_members_and_reports_current_roster() {
        let mut channel = ChatChannel::new("general", "", true);
        let (tx_a, mut rx_a) = mpsc::channel(8);
        channel.join(1, "alice".into(), tx_a);

        let (tx_b, _rx_b) = mpsc::channel(8);
        channel.join(2, "bob".into(), tx_b);

        let announced = rx_a.try_recv().unwrap();
        assert_eq!(announced.item_sub_type, "chat_join_channel");

        let roster = channel.users();
        assert_eq!(roster.len(), 2);
        assert!(roster.iter().any(|u| u.name == "alice"));
        assert!(roster.iter().any(|u| u.name == "bob"));
    }

    #[test]
    fn leave_removes_member_and_shrinks_roster() {
        let mut channel = ChatChannel::new("general", "", true);
        let (tx_a, _rx_a) = mpsc::channel(8);
        channel.join(1, "alice".into(), tx_a);
        assert!(!channel.is_empty());

        channel.leave(1);
        assert!(channel.is_empty());
        assert_eq!(channel.users().len(), 0);
    }
}
