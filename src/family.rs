// family.rs - Relationship oracle and the in-memory family tree
// The tree is loaded once from JSON at startup and only read afterwards.

use serde::{Deserialize, Serialize};
use serenity::model::id::UserId;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

/// Answers "how is `other` related to `user`" queries.
pub trait RelationshipOracle: Send + Sync {
    /// Relation label of `other` as seen from `user`, or `None` if unrelated
    fn relation(&self, user: UserId, other: UserId) -> Option<String>;
}

/// The part of a relation label the commands branch on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    None,
    Partner,
    Family(String),
}

impl Relation {
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            None => Relation::None,
            Some(label) if label.to_lowercase() == "partner" => Relation::Partner,
            Some(label) => Relation::Family(label.to_string()),
        }
    }

    pub fn is_family(&self) -> bool {
        matches!(self, Relation::Family(_))
    }
}

#[derive(Debug, Error)]
pub enum FamilyTreeError {
    #[error("failed to read family tree file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse family tree file: {0}")]
    Json(#[from] serde_json::Error),
}

/// One person in the tree as stored on disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FamilyTreeMember {
    pub id: u64,
    #[serde(default)]
    pub parent: Option<u64>,
    #[serde(default)]
    pub children: Vec<u64>,
    #[serde(default)]
    pub partner: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FamilyTreeFile {
    #[serde(default)]
    members: Vec<FamilyTreeMember>,
}

/// In-memory family tree, read-only after load
#[derive(Debug, Default)]
pub struct FamilyTree {
    members: HashMap<u64, FamilyTreeMember>,
}

impl FamilyTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree, filling in parent links implied by children lists
    /// and partner links that were only written on one side.
    pub fn from_members(members: Vec<FamilyTreeMember>) -> Self {
        let mut map: HashMap<u64, FamilyTreeMember> =
            members.into_iter().map(|m| (m.id, m)).collect();

        let implied: Vec<(u64, u64)> = map
            .values()
            .flat_map(|m| m.children.iter().map(move |child| (*child, m.id)))
            .collect();
        for (child, parent) in implied {
            let entry = map.entry(child).or_insert_with(|| FamilyTreeMember {
                id: child,
                ..Default::default()
            });
            if entry.parent.is_none() {
                entry.parent = Some(parent);
            }
        }

        let partners: Vec<(u64, u64)> = map
            .values()
            .filter_map(|m| m.partner.map(|p| (p, m.id)))
            .collect();
        for (member, partner) in partners {
            let entry = map.entry(member).or_insert_with(|| FamilyTreeMember {
                id: member,
                ..Default::default()
            });
            if entry.partner.is_none() {
                entry.partner = Some(partner);
            }
        }

        Self { members: map }
    }

    pub fn from_json(content: &str) -> Result<Self, FamilyTreeError> {
        let file: FamilyTreeFile = serde_json::from_str(content)?;
        Ok(Self::from_members(file.members))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FamilyTreeError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn parent(&self, id: u64) -> Option<u64> {
        self.members.get(&id).and_then(|m| m.parent)
    }

    fn partner(&self, id: u64) -> Option<u64> {
        self.members.get(&id).and_then(|m| m.partner)
    }

    /// Ancestors from nearest to furthest, stopping if the chain loops
    fn ancestors(&self, id: u64) -> Vec<u64> {
        let mut seen = HashSet::from([id]);
        let mut chain = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if !seen.insert(parent) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }
}

impl RelationshipOracle for FamilyTree {
    fn relation(&self, user: UserId, other: UserId) -> Option<String> {
        let (a, b) = (user.0, other.0);
        if a == b {
            return None;
        }
        if self.partner(a) == Some(b) {
            return Some("partner".to_string());
        }

        let a_up = self.ancestors(a);
        let b_up = self.ancestors(b);

        let label = if a_up.first() == Some(&b) {
            "parent"
        } else if b_up.first() == Some(&a) {
            "child"
        } else if a_up.first().is_some() && a_up.first() == b_up.first() {
            "sibling"
        } else if a_up.get(1) == Some(&b) {
            "grandparent"
        } else if b_up.get(1) == Some(&a) {
            "grandchild"
        } else {
            let a_line: HashSet<u64> = a_up.iter().copied().chain([a]).collect();
            let shared = b_up.iter().chain([&b]).any(|id| a_line.contains(id));
            if !shared {
                return None;
            }
            "relative"
        };
        Some(label.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> FamilyTree {
        // 1 ─┬─ 2 ─── 4 ─── 6
        //    └─ 3 ─── 5
        // 2 and 7 are partners, 8 is a stranger
        FamilyTree::from_json(
            r#"{"members":[
                {"id":1,"children":[2,3]},
                {"id":2,"children":[4],"partner":7},
                {"id":3,"children":[5]},
                {"id":4,"children":[6]},
                {"id":8}
            ]}"#,
        )
        .unwrap()
    }

    fn rel(t: &FamilyTree, a: u64, b: u64) -> Option<String> {
        t.relation(UserId(a), UserId(b))
    }

    #[test]
    fn test_direct_relations() {
        let t = tree();
        assert_eq!(rel(&t, 2, 1).as_deref(), Some("parent"));
        assert_eq!(rel(&t, 1, 2).as_deref(), Some("child"));
        assert_eq!(rel(&t, 2, 3).as_deref(), Some("sibling"));
        assert_eq!(rel(&t, 4, 1).as_deref(), Some("grandparent"));
        assert_eq!(rel(&t, 1, 4).as_deref(), Some("grandchild"));
        assert_eq!(rel(&t, 6, 5).as_deref(), Some("relative"));
    }

    #[test]
    fn test_partner_is_symmetric() {
        let t = tree();
        assert_eq!(rel(&t, 2, 7).as_deref(), Some("partner"));
        assert_eq!(rel(&t, 7, 2).as_deref(), Some("partner"));
    }

    #[test]
    fn test_unrelated_and_self() {
        let t = tree();
        assert_eq!(rel(&t, 8, 1), None);
        assert_eq!(rel(&t, 7, 1), None);
        assert_eq!(rel(&t, 1, 1), None);
        assert_eq!(rel(&t, 100, 200), None);
    }

    #[test]
    fn test_cyclic_parents_terminate() {
        let t = FamilyTree::from_members(vec![
            FamilyTreeMember { id: 1, parent: Some(2), ..Default::default() },
            FamilyTreeMember { id: 2, parent: Some(1), ..Default::default() },
            FamilyTreeMember { id: 3, ..Default::default() },
        ]);
        assert_eq!(rel(&t, 1, 3), None);
        assert_eq!(rel(&t, 1, 2).as_deref(), Some("parent"));
    }

    #[test]
    fn test_relation_classification() {
        assert_eq!(Relation::from_label(None), Relation::None);
        assert_eq!(Relation::from_label(Some("PARTNER")), Relation::Partner);
        assert!(Relation::from_label(Some("sibling")).is_family());
        assert!(!Relation::from_label(Some("Partner")).is_family());
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(FamilyTree::from_json("{"), Err(FamilyTreeError::Json(_))));
    }
}
