//! Binding of routers to containers.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use tracing::debug;

use crate::error::RouterError;
use crate::host::{FrameTree, Navigation};
use crate::options::{Command, RouterOptions};
use crate::router::FrameRouter;

/// One router per container, keyed by whatever identifies a container to
/// the host.
#[derive(Debug)]
pub struct RouterRegistry<K, E, C> {
    routers: HashMap<K, FrameRouter<E, C>>,
}

impl<K, E, C> Default for RouterRegistry<K, E, C> {
    fn default() -> Self {
        Self {
            routers: HashMap::new(),
        }
    }
}

impl<K, E, C> RouterRegistry<K, E, C>
where
    K: Eq + Hash + Debug,
    E: Clone + PartialEq,
{
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a router to `key` unless one exists, then forward `command`.
    ///
    /// `options` only apply when the router is created.
    pub fn bind<D>(
        &mut self,
        key: K,
        doc: &D,
        options: RouterOptions,
        command: Option<Command<C>>,
    ) -> &mut FrameRouter<E, C>
    where
        D: FrameTree<Element = E> + Navigation,
    {
        let router = self.routers.entry(key).or_insert_with(|| {
            debug!("attaching router to container");
            FrameRouter::attach(doc, options)
        });
        if let Some(command) = command {
            router.command(doc, command);
        }
        router
    }

    /// Forward `command` to the router bound to `key`.
    pub fn command<D>(&mut self, key: &K, doc: &D, command: Command<C>) -> Result<(), RouterError>
    where
        D: FrameTree<Element = E>,
    {
        let router = self
            .routers
            .get_mut(key)
            .ok_or_else(|| RouterError::NotAttached(format!("{key:?}")))?;
        router.command(doc, command);
        Ok(())
    }

    /// Router bound to `key`.
    pub fn get(&self, key: &K) -> Option<&FrameRouter<E, C>> {
        self.routers.get(key)
    }

    /// Router bound to `key`, mutably.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut FrameRouter<E, C>> {
        self.routers.get_mut(key)
    }

    /// Remove the router bound to `key`.
    pub fn detach(&mut self, key: &K) -> Option<FrameRouter<E, C>> {
        self.routers.remove(key)
    }

    /// Number of bound containers.
    pub fn len(&self) -> usize {
        self.routers.len()
    }

    /// Check whether no container is bound.
    pub fn is_empty(&self) -> bool {
        self.routers.is_empty()
    }
}
