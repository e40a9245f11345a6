//! Property-path traversal over the entities visible to a cursor

use std::collections::VecDeque;

use crate::core::{Entity, EntityKey, Pattern};
use crate::error::{HodError, Result};
use crate::execution::cursor::Cursor;
use crate::execution::relation::EntitySet;

/// One segment of a property path: a predicate and its quantifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathEdge {
    pub predicate: EntityKey,
    pub pattern: Pattern,
}

impl PathEdge {
    pub fn new(predicate: EntityKey, pattern: Pattern) -> Self {
        Self { predicate, pattern }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn single(self, entity: &Entity, predicate: &EntityKey) -> Vec<EntityKey> {
        match self {
            Direction::Forward => entity.out_edges(predicate),
            Direction::Backward => entity.in_edges(predicate),
        }
    }

    fn materialized(self, entity: &Entity, predicate: &EntityKey) -> Vec<EntityKey> {
        match self {
            Direction::Forward => entity.out_plus_edges(predicate),
            Direction::Backward => entity.in_plus_edges(predicate),
        }
    }
}

impl Cursor {
    /// Entities reachable from `start` over `predicate` with `pattern`.
    ///
    /// Returns the reached set and the set of entities walked to get there.
    /// A missing `start` is reported as `NotFound`.
    pub fn follow_path_from_subject(
        &self,
        start: &EntityKey,
        predicate: &EntityKey,
        pattern: Pattern,
    ) -> Result<(EntitySet, EntitySet)> {
        self.follow_path(start, predicate, pattern, Direction::Forward)
    }

    /// Entities from which `start` is reachable over `predicate` with `pattern`.
    pub fn follow_path_from_object(
        &self,
        start: &EntityKey,
        predicate: &EntityKey,
        pattern: Pattern,
    ) -> Result<(EntitySet, EntitySet)> {
        self.follow_path(start, predicate, pattern, Direction::Backward)
    }

    fn follow_path(
        &self,
        start: &EntityKey,
        predicate: &EntityKey,
        pattern: Pattern,
        direction: Direction,
    ) -> Result<(EntitySet, EntitySet)> {
        let first = self.get_entity(start)?;
        let mut results = EntitySet::new();
        let mut seen = EntitySet::new();
        let mut queue = VecDeque::from([*start]);

        while let Some(key) = queue.pop_front() {
            if !seen.insert(key) {
                continue;
            }
            let entity = if key == *start {
                first.clone()
            } else {
                self.get_entity(&key).map_err(|e| HodError::Traversal(format!("walking {}: {}", key, e)))?
            };
            match pattern {
                Pattern::Single => results.extend(direction.single(&entity, predicate)),
                Pattern::ZeroOne => {
                    results.insert(key);
                    results.extend(direction.single(&entity, predicate));
                }
                Pattern::OnePlus | Pattern::ZeroPlus => {
                    if pattern == Pattern::ZeroPlus {
                        results.insert(key);
                    }
                    let mut next = direction.materialized(&entity, predicate);
                    next.extend(direction.single(&entity, predicate));
                    for reached in next {
                        results.insert(reached);
                        if !seen.contains(&reached) {
                            queue.push_back(reached);
                        }
                    }
                }
            }
        }
        Ok((results, seen))
    }

    /// Objects reached from `subject` by walking `path` segment by segment.
    pub fn get_object_from_subject_pred(&self, subject: &EntityKey, path: &[PathEdge]) -> Result<EntitySet> {
        self.walk_path(subject, path.iter(), Direction::Forward)
    }

    /// Subjects that reach `object` over `path`, walked from the last segment back.
    pub fn get_subject_from_pred_object(&self, object: &EntityKey, path: &[PathEdge]) -> Result<EntitySet> {
        self.walk_path(object, path.iter().rev(), Direction::Backward)
    }

    fn walk_path<'a, I>(&self, start: &EntityKey, segments: I, direction: Direction) -> Result<EntitySet>
    where
        I: Iterator<Item = &'a PathEdge>,
    {
        let mut frontier = EntitySet::from([*start]);
        for segment in segments {
            let mut reached = EntitySet::new();
            // a node already walked in this segment contributes nothing new
            let mut walked = EntitySet::new();
            for node in &frontier {
                if walked.contains(node) {
                    continue;
                }
                match self.follow_path(node, &segment.predicate, segment.pattern, direction) {
                    Ok((results, seen)) => {
                        reached.extend(results);
                        walked.extend(seen);
                    }
                    Err(e) if e.is_not_found() => continue,
                    Err(e) => return Err(e),
                }
            }
            frontier = reached;
            if frontier.is_empty() {
                break;
            }
        }
        Ok(frontier)
    }

    /// `(subject, object)` pairs linked by `predicate`, read from its endpoints.
    pub fn get_subject_object_from_pred(&self, predicate: &EntityKey) -> Result<Vec<(EntityKey, EntityKey)>> {
        match self.get_entity(predicate) {
            Ok(entity) => Ok(entity.all_endpoints()),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// `(subject, object)` pairs linked by a whole path.
    ///
    /// A lone single-hop segment is answered from the predicate's endpoints.
    /// Otherwise every possible start of the path is walked.
    pub fn get_subject_object_from_path(&self, path: &[PathEdge]) -> Result<Vec<(EntityKey, EntityKey)>> {
        let Some(first) = path.first() else {
            return Ok(Vec::new());
        };
        if path.len() == 1 && first.pattern == Pattern::Single {
            return self.get_subject_object_from_pred(&first.predicate);
        }
        let mut pairs = Vec::new();
        for subject in self.path_starts(path)? {
            for object in self.get_object_from_subject_pred(&subject, path)? {
                pairs.push((subject, object));
            }
        }
        Ok(pairs)
    }

    /// Subjects of the first segment's predicate. While the leading segments
    /// may match zero hops (`?`, `*`), subjects of the next segment count too.
    fn path_starts(&self, path: &[PathEdge]) -> Result<EntitySet> {
        let mut starts = EntitySet::new();
        for segment in path {
            starts.extend(self.get_subject_object_from_pred(&segment.predicate)?.into_iter().map(|(s, _)| s));
            if !matches!(segment.pattern, Pattern::ZeroOne | Pattern::ZeroPlus) {
                break;
            }
        }
        Ok(starts)
    }

    /// Predicates `p` such that `subject p object` holds.
    pub fn get_predicate_from_subject_object(&self, subject: &EntityKey, object: &EntityKey) -> Result<EntitySet> {
        let entity = match self.get_entity(subject) {
            Ok(entity) => entity,
            Err(e) if e.is_not_found() => return Ok(EntitySet::new()),
            Err(e) => return Err(e),
        };
        Ok(entity.all_out_edges().into_iter().filter(|(_, value)| value == object).map(|(pred, _)| pred).collect())
    }

    /// `(subject, predicate)` pairs of the `Single` edges arriving at `object`.
    pub fn get_subject_pred_from_object(&self, object: &EntityKey) -> Result<Vec<(EntityKey, EntityKey)>> {
        match self.get_entity(object) {
            Ok(entity) => Ok(entity.all_in_edges().into_iter().map(|(pred, subject)| (subject, pred)).collect()),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// `(predicate, object)` pairs of the `Single` edges leaving `subject`.
    pub fn get_pred_object_from_subject(&self, subject: &EntityKey) -> Result<Vec<(EntityKey, EntityKey)>> {
        match self.get_entity(subject) {
            Ok(entity) => Ok(entity.all_out_edges()),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}
