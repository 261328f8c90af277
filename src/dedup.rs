//! Duplicate collapse over one normalized result batch.
//!
//! Keys on the lowercased username; the first-seen record wins entirely
//! and order is preserved. No cross-record field merging: duplicates
//! within one query are rare and near-identical, so determinism beats
//! marginal completeness.

use std::collections::HashSet;

use crate::models::Channel;

/// Drop later records whose username was already seen in this batch.
pub fn dedup(channels: Vec<Channel>) -> Vec<Channel> {
    let mut seen: HashSet<String> = HashSet::with_capacity(channels.len());
    channels
        .into_iter()
        .filter(|c| seen.insert(c.username.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, ChannelStatus, Language};

    fn channel(username: &str, members: u64) -> Channel {
        Channel {
            id: format!("test-{}", username),
            name: username.to_string(),
            username: username.to_string(),
            description: String::new(),
            members,
            category: Category::All,
            language: Language::All,
            status: ChannelStatus::Active,
            last_active: "Recently".to_string(),
            avatar_url: String::new(),
            verified: false,
        }
    }

    #[test]
    fn first_seen_wins_and_order_is_preserved() {
        let out = dedup(vec![
            channel("alpha", 10),
            channel("beta", 20),
            channel("alpha", 99),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].username, "alpha");
        assert_eq!(out[0].members, 10);
        assert_eq!(out[1].username, "beta");
    }

    #[test]
    fn usernames_compare_case_insensitively() {
        let out = dedup(vec![channel("Alpha", 1), channel("ALPHA", 2)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].members, 1);
    }

    #[test]
    fn empty_batch_stays_empty() {
        assert!(dedup(Vec::new()).is_empty());
    }
}
