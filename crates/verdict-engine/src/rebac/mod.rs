//! ReBAC decision engine: reachability in a directed labeled graph
//! combined with a relationship-to-permission mapping.
//!
//! # Purpose
//! Decides requests by walking relationships from the subject towards the
//! object: directly, through group membership, up parent hierarchies, and
//! over bounded social paths. Every grant carries a human-readable path
//! explanation of the form `sub -[rel]-> ... -> obj`.
//!
//! # Graph shape
//! The edge index maps `(subject, relationship)` to the edges leaving that
//! subject under that label. Each stored edge also inserts a mirrored entry
//! under `(object, "reverse_" + relationship)`. Reverse entries exist only
//! as a traversal aid; they are never returned by listings and never
//! participate in direct-relationship checks.
//!
//! # Bounds
//! Parent chains are not required to be acyclic, so hierarchical recursion
//! carries a depth bound and a visited set. Social reachability is a
//! breadth-first search capped at depth 3.
mod permissions;

pub use permissions::normalize_action;

use crate::error::EngineResult;
use crate::model::Relationship;
use crate::repository::RebacRepository;
use permissions::{PERMISSION_READ, PERMISSION_READ_LIMITED, default_permission_map, grants};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

const REVERSE_PREFIX: &str = "reverse_";
const RELATIONSHIP_MEMBER: &str = "member";
const RELATIONSHIP_PARENT: &str = "parent";
const RELATIONSHIP_FRIEND: &str = "friend";

/// Bound on hierarchical recursion through `parent` edges.
const MAX_PARENT_DEPTH: u32 = 5;
/// Depth cap for the social reachability search.
const SOCIAL_MAX_DEPTH: i32 = 3;
/// Substituted when `find_path` is called with a non-positive depth.
const DEFAULT_PATH_DEPTH: i32 = 5;

type EdgeKey = (String, String);
type EdgeIndex = HashMap<EdgeKey, Vec<Relationship>>;

pub struct RebacEngine {
    repo: Arc<dyn RebacRepository>,
    edges: RwLock<EdgeIndex>,
    /// Fixed at construction; read without locking afterwards.
    permissions: HashMap<String, Vec<String>>,
}

impl RebacEngine {
    /// Builds the engine with the default permission map and replays the
    /// relationship repository into the edge index.
    pub async fn bootstrap(repo: Arc<dyn RebacRepository>) -> EngineResult<Self> {
        let engine = Self {
            repo,
            edges: RwLock::new(EdgeIndex::new()),
            permissions: default_permission_map(),
        };
        engine.reload().await?;
        Ok(engine)
    }

    /// Replaces the edge index with a full replay of the repository.
    pub async fn reload(&self) -> EngineResult<()> {
        let records = self.repo.load_relationships().await?;
        let mut edges = self.edges.write().await;
        edges.clear();
        for record in records {
            insert_edge(&mut edges, &record.subject, &record.relationship, &record.object);
        }
        tracing::debug!(keys = edges.len(), "relationship graph replayed");
        Ok(())
    }

    /// Checks access and returns the reachability path on a grant.
    ///
    /// The checks run in a fixed order — direct, group, hierarchical,
    /// social — so the explanation path is deterministic even when several
    /// routes would grant.
    pub async fn enforce(&self, subject: &str, object: &str, action: &str) -> (bool, String) {
        let edges = self.edges.read().await;
        let permission = normalize_action(action);
        let mut visited = HashSet::new();
        match self.check_access(&edges, subject, object, permission, 0, &mut visited) {
            Some(path) => (true, path),
            None => (false, String::new()),
        }
    }

    fn check_access(
        &self,
        edges: &EdgeIndex,
        subject: &str,
        object: &str,
        permission: &str,
        depth: u32,
        visited: &mut HashSet<String>,
    ) -> Option<String> {
        if depth > MAX_PARENT_DEPTH {
            return None;
        }
        // Revisiting an object means a parent cycle; cut it off.
        if !visited.insert(object.to_string()) {
            return None;
        }

        // 1. Direct relationships between subject and object.
        for relationship in direct_relationships(edges, subject, object) {
            if self.relationship_grants(&relationship, permission) {
                return Some(format!("{subject} -[{relationship}]-> {object}"));
            }
        }

        // 2. Group membership: subject -[member]-> group -[r]-> object.
        if let Some(groups) =
            edges.get(&(subject.to_string(), RELATIONSHIP_MEMBER.to_string()))
        {
            for group_edge in groups {
                let group = &group_edge.object;
                for relationship in direct_relationships(edges, group, object) {
                    if self.relationship_grants(&relationship, permission) {
                        return Some(format!(
                            "{subject} -[{RELATIONSHIP_MEMBER}]-> {group} -[{relationship}]-> {object}"
                        ));
                    }
                }
            }
        }

        // 3. Hierarchical access: access to any parent of the object
        // extends to the object itself.
        for parent in parent_objects(edges, object) {
            if let Some(parent_path) =
                self.check_access(edges, subject, &parent, permission, depth + 1, visited)
            {
                return Some(format!(
                    "{parent_path} -> {parent} -[{RELATIONSHIP_PARENT}]-> {object}"
                ));
            }
        }

        // 4. Social reachability grants limited reads only. The path must
        // traverse a friend edge; matching is by substring, so an
        // identifier containing "friend" can satisfy it (kept for
        // compatibility with existing deployments).
        if permission == PERMISSION_READ || permission == PERMISSION_READ_LIMITED {
            let (found, path) = find_path_in(edges, subject, object, SOCIAL_MAX_DEPTH);
            if found
                && path.contains(RELATIONSHIP_FRIEND)
                && self.check_relationship_permission(RELATIONSHIP_FRIEND, PERMISSION_READ_LIMITED)
            {
                return Some(path);
            }
        }

        None
    }

    fn relationship_grants(&self, relationship: &str, permission: &str) -> bool {
        self.permissions
            .get(relationship)
            .is_some_and(|permissions| grants(permissions, permission))
    }

    /// Breadth-first path search over forward edges, for debugging and
    /// audit. `max_depth <= 0` is substituted with 5.
    pub async fn find_path(
        &self,
        subject: &str,
        target: &str,
        max_depth: i32,
    ) -> (bool, String) {
        let edges = self.edges.read().await;
        find_path_in(&edges, subject, target, max_depth)
    }

    /// Write-through: the repository write happens first; the cache gains
    /// the forward and reverse entries only after it succeeds. The core
    /// does not deduplicate; a deduplicating store makes the first write
    /// win.
    pub async fn add_relationship(
        &self,
        subject: &str,
        relationship: &str,
        object: &str,
    ) -> EngineResult<()> {
        let mut edges = self.edges.write().await;
        self.repo
            .add_relationship(subject, relationship, object)
            .await?;
        insert_edge(&mut edges, subject, relationship, object);
        Ok(())
    }

    /// Silent on absent edges.
    pub async fn remove_relationship(
        &self,
        subject: &str,
        relationship: &str,
        object: &str,
    ) -> EngineResult<()> {
        let mut edges = self.edges.write().await;
        self.repo
            .remove_relationship(subject, relationship, object)
            .await?;
        remove_edge(&mut edges, subject, relationship, object);
        Ok(())
    }

    /// Forward relationships for a subject, or all forward relationships
    /// when `subject` is empty. Reverse entries are never listed.
    pub async fn relationships(&self, subject: &str) -> Vec<Relationship> {
        let edges = self.edges.read().await;
        let mut items = Vec::new();
        for ((edge_subject, relationship), entries) in edges.iter() {
            if relationship.starts_with(REVERSE_PREFIX) {
                continue;
            }
            if !subject.is_empty() && edge_subject != subject {
                continue;
            }
            items.extend(entries.iter().cloned());
        }
        items.sort();
        items
    }

    /// Copy of the relationship-to-permission mapping.
    pub fn relationship_permissions(&self) -> HashMap<String, Vec<String>> {
        self.permissions.clone()
    }

    /// Whether `relationship` grants `permission` (directly or through
    /// `admin` dominance).
    pub fn check_relationship_permission(&self, relationship: &str, permission: &str) -> bool {
        self.relationship_grants(relationship, permission)
    }

    /// Permissions listed for a relationship type; empty when unknown.
    pub fn permissions_for_relationship(&self, relationship: &str) -> Vec<String> {
        self.permissions
            .get(relationship)
            .cloned()
            .unwrap_or_default()
    }
}

fn insert_edge(edges: &mut EdgeIndex, subject: &str, relationship: &str, object: &str) {
    edges
        .entry((subject.to_string(), relationship.to_string()))
        .or_default()
        .push(Relationship::new(subject, relationship, object));

    let reverse = format!("{REVERSE_PREFIX}{relationship}");
    edges
        .entry((object.to_string(), reverse.clone()))
        .or_default()
        .push(Relationship::new(object, reverse, subject));
}

fn remove_edge(edges: &mut EdgeIndex, subject: &str, relationship: &str, object: &str) {
    if let Some(entries) =
        edges.get_mut(&(subject.to_string(), relationship.to_string()))
    {
        if let Some(position) = entries.iter().position(|edge| edge.object == object) {
            entries.remove(position);
        }
    }
    let reverse = format!("{REVERSE_PREFIX}{relationship}");
    if let Some(entries) = edges.get_mut(&(object.to_string(), reverse)) {
        if let Some(position) = entries.iter().position(|edge| edge.object == subject) {
            entries.remove(position);
        }
    }
}

/// All forward relationship labels between `subject` and `object`, ordered
/// by label so returned paths are deterministic.
fn direct_relationships(edges: &EdgeIndex, subject: &str, object: &str) -> Vec<String> {
    let mut labels = Vec::new();
    for ((edge_subject, relationship), entries) in edges {
        if edge_subject != subject || relationship.starts_with(REVERSE_PREFIX) {
            continue;
        }
        if entries.iter().any(|edge| edge.object == object) {
            labels.push(relationship.clone());
        }
    }
    labels.sort();
    labels
}

/// Subjects holding a `parent` edge onto `object`, ordered for
/// deterministic traversal.
fn parent_objects(edges: &EdgeIndex, object: &str) -> Vec<String> {
    let mut parents = Vec::new();
    for ((edge_subject, relationship), entries) in edges {
        if relationship != RELATIONSHIP_PARENT {
            continue;
        }
        if entries.iter().any(|edge| edge.object == object) {
            parents.push(edge_subject.clone());
        }
    }
    parents.sort();
    parents
}

fn find_path_in(edges: &EdgeIndex, subject: &str, target: &str, max_depth: i32) -> (bool, String) {
    let max_depth = if max_depth <= 0 {
        DEFAULT_PATH_DEPTH
    } else {
        max_depth
    };

    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<(String, String, i32)> = VecDeque::new();
    queue.push_back((subject.to_string(), subject.to_string(), 0));

    while let Some((node, path, depth)) = queue.pop_front() {
        if depth > max_depth {
            continue;
        }
        if node == target {
            return (true, path);
        }
        if !visited.insert(node.clone()) {
            continue;
        }

        for (relationship, edge) in outgoing_edges(edges, &node) {
            if !visited.contains(&edge.object) {
                let next_path = format!("{path} -[{relationship}]-> {}", edge.object);
                queue.push_back((edge.object.clone(), next_path, depth + 1));
            }
        }
    }

    (false, String::new())
}

/// Forward edges leaving `node`, in sorted order for deterministic search.
fn outgoing_edges<'a>(edges: &'a EdgeIndex, node: &str) -> Vec<(&'a str, &'a Relationship)> {
    let mut found = Vec::new();
    for ((edge_subject, relationship), entries) in edges {
        if edge_subject != node || relationship.starts_with(REVERSE_PREFIX) {
            continue;
        }
        for edge in entries {
            found.push((relationship.as_str(), edge));
        }
    }
    found.sort_by(|left, right| (left.0, &left.1.object).cmp(&(right.0, &right.1.object)));
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    async fn engine_with_store() -> (RebacEngine, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let engine = RebacEngine::bootstrap(store.clone())
            .await
            .expect("bootstrap");
        (engine, store)
    }

    async fn add(engine: &RebacEngine, subject: &str, relationship: &str, object: &str) {
        engine
            .add_relationship(subject, relationship, object)
            .await
            .expect("add relationship");
    }

    #[tokio::test]
    async fn direct_ownership_grants_everything() {
        let (engine, _store) = engine_with_store().await;
        add(&engine, "alice", "owner", "doc1").await;

        for action in ["read", "write", "delete", "admin", "manage"] {
            let (allowed, path) = engine.enforce("alice", "doc1", action).await;
            assert!(allowed, "{action} should be granted");
            assert_eq!(path, "alice -[owner]-> doc1");
        }
    }

    #[tokio::test]
    async fn editor_can_write_but_not_delete() {
        let (engine, _store) = engine_with_store().await;
        add(&engine, "bob", "editor", "doc1").await;

        let (allowed, _) = engine.enforce("bob", "doc1", "write").await;
        assert!(allowed);
        let (allowed, path) = engine.enforce("bob", "doc1", "delete").await;
        assert!(!allowed);
        assert!(path.is_empty());
    }

    #[tokio::test]
    async fn action_normalization_applies_before_checks() {
        let (engine, _store) = engine_with_store().await;
        add(&engine, "bob", "editor", "doc1").await;
        add(&engine, "carol", "viewer", "doc1").await;

        let (allowed, _) = engine.enforce("bob", "doc1", "edit").await;
        assert!(allowed);
        let (allowed, _) = engine.enforce("bob", "doc1", "modify").await;
        assert!(allowed);
        let (allowed, _) = engine.enforce("carol", "doc1", "view").await;
        assert!(allowed);
        let (allowed, _) = engine.enforce("bob", "doc1", "remove").await;
        assert!(!allowed);
    }

    #[tokio::test]
    async fn group_membership_reaches_group_resources() {
        let (engine, _store) = engine_with_store().await;
        add(&engine, "alice", "member", "eng_team").await;
        add(&engine, "eng_team", "group_access", "source_code").await;

        let (allowed, path) = engine.enforce("alice", "source_code", "read").await;
        assert!(allowed);
        assert_eq!(
            path,
            "alice -[member]-> eng_team -[group_access]-> source_code"
        );

        // group_access does not grant delete.
        let (allowed, _) = engine.enforce("alice", "source_code", "delete").await;
        assert!(!allowed);
    }

    #[tokio::test]
    async fn hierarchical_access_descends_from_parent() {
        let (engine, _store) = engine_with_store().await;
        add(&engine, "alice", "owner", "folder").await;
        add(&engine, "folder", "parent", "folder/file").await;

        let (allowed, path) = engine.enforce("alice", "folder/file", "write").await;
        assert!(allowed);
        assert_eq!(
            path,
            "alice -[owner]-> folder -> folder -[parent]-> folder/file"
        );
    }

    #[tokio::test]
    async fn hierarchical_access_chains_across_levels() {
        let (engine, _store) = engine_with_store().await;
        add(&engine, "alice", "owner", "root").await;
        add(&engine, "root", "parent", "mid").await;
        add(&engine, "mid", "parent", "leaf").await;

        let (allowed, path) = engine.enforce("alice", "leaf", "read").await;
        assert!(allowed);
        assert!(path.starts_with("alice -[owner]-> root"));
        assert!(path.ends_with("-[parent]-> leaf"));
    }

    #[tokio::test]
    async fn parent_cycle_terminates_with_deny() {
        let (engine, _store) = engine_with_store().await;
        add(&engine, "a", "parent", "b").await;
        add(&engine, "b", "parent", "a").await;

        let (allowed, _) = engine.enforce("nobody", "a", "read").await;
        assert!(!allowed);
    }

    #[tokio::test]
    async fn friend_grants_limited_read_only() {
        let (engine, _store) = engine_with_store().await;
        add(&engine, "alice", "friend", "bob").await;
        add(&engine, "bob", "owner", "bob_photos").await;

        let (allowed, path) = engine.enforce("alice", "bob_photos", "read").await;
        assert!(allowed);
        assert!(path.contains("friend"));

        let (allowed, _) = engine.enforce("alice", "bob_photos", "write").await;
        assert!(!allowed);
    }

    #[tokio::test]
    async fn social_search_is_depth_bounded() {
        let (engine, _store) = engine_with_store().await;
        add(&engine, "alice", "friend", "b").await;
        add(&engine, "b", "friend", "c").await;
        add(&engine, "c", "friend", "d").await;
        add(&engine, "d", "friend", "target").await;

        // target is four hops out; the social search stops at three.
        let (allowed, _) = engine.enforce("alice", "target", "read").await;
        assert!(!allowed);

        let (allowed, _) = engine.enforce("alice", "d", "read").await;
        assert!(allowed);
    }

    #[tokio::test]
    async fn granted_paths_span_subject_to_object() {
        let (engine, _store) = engine_with_store().await;
        add(&engine, "alice", "member", "team").await;
        add(&engine, "team", "group_access", "wiki").await;
        add(&engine, "alice", "owner", "folder").await;
        add(&engine, "folder", "parent", "note").await;

        for object in ["wiki", "note"] {
            let (allowed, path) = engine.enforce("alice", object, "read").await;
            assert!(allowed);
            assert!(path.starts_with("alice"), "path: {path}");
            assert!(path.ends_with(object), "path: {path}");
            assert!(path.contains(" -["), "path: {path}");
        }
    }

    #[tokio::test]
    async fn find_path_walks_forward_edges_only() {
        let (engine, _store) = engine_with_store().await;
        add(&engine, "alice", "member", "team").await;
        add(&engine, "team", "group_access", "wiki").await;

        let (found, path) = engine.find_path("alice", "wiki", 5).await;
        assert!(found);
        assert_eq!(path, "alice -[member]-> team -[group_access]-> wiki");

        // No forward edge leads from wiki back to alice; the reverse
        // entries must not be followed.
        let (found, path) = engine.find_path("wiki", "alice", 5).await;
        assert!(!found);
        assert!(path.is_empty());
    }

    #[tokio::test]
    async fn find_path_zero_depth_defaults_and_self_target() {
        let (engine, _store) = engine_with_store().await;
        let (found, path) = engine.find_path("alice", "alice", 0).await;
        assert!(found);
        assert_eq!(path, "alice");

        let (found, _) = engine.find_path("alice", "bob", 0).await;
        assert!(!found);
    }

    #[tokio::test]
    async fn listings_exclude_reverse_entries() {
        let (engine, _store) = engine_with_store().await;
        add(&engine, "alice", "owner", "doc1").await;
        add(&engine, "bob", "viewer", "doc1").await;

        let alice = engine.relationships("alice").await;
        assert_eq!(alice, vec![Relationship::new("alice", "owner", "doc1")]);

        // doc1 only appears as the target of forward edges; its reverse
        // entries are invisible.
        assert!(engine.relationships("doc1").await.is_empty());

        let all = engine.relationships("").await;
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|r| !r.relationship.starts_with("reverse_")));
    }

    #[tokio::test]
    async fn remove_relationship_revokes_access() {
        let (engine, _store) = engine_with_store().await;
        add(&engine, "alice", "owner", "doc1").await;
        let (allowed, _) = engine.enforce("alice", "doc1", "read").await;
        assert!(allowed);

        engine
            .remove_relationship("alice", "owner", "doc1")
            .await
            .expect("remove");
        let (allowed, _) = engine.enforce("alice", "doc1", "read").await;
        assert!(!allowed);
        assert!(engine.relationships("").await.is_empty());

        // Removing again is silent.
        engine
            .remove_relationship("alice", "owner", "doc1")
            .await
            .expect("silent");
    }

    #[tokio::test]
    async fn permission_projections_are_read_only_views() {
        let (engine, _store) = engine_with_store().await;
        let mappings = engine.relationship_permissions();
        assert_eq!(mappings.len(), 8);

        assert!(engine.check_relationship_permission("owner", "delete"));
        assert!(engine.check_relationship_permission("manager", "write"));
        assert!(!engine.check_relationship_permission("viewer", "write"));
        assert!(!engine.check_relationship_permission("unknown", "read"));
        assert_eq!(
            engine.permissions_for_relationship("friend"),
            vec!["read_limited"]
        );
        assert!(engine.permissions_for_relationship("unknown").is_empty());
    }

    #[tokio::test]
    async fn writes_survive_restart_replay() {
        let (engine, store) = engine_with_store().await;
        add(&engine, "alice", "member", "eng_team").await;
        add(&engine, "eng_team", "group_access", "source_code").await;
        drop(engine);

        let replayed = RebacEngine::bootstrap(store).await.expect("bootstrap");
        let (allowed, path) = replayed.enforce("alice", "source_code", "read").await;
        assert!(allowed);
        assert_eq!(
            path,
            "alice -[member]-> eng_team -[group_access]-> source_code"
        );
    }
}
