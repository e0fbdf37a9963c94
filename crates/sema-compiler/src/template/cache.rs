//! Template instance cache.
//!
//! Every instance created by [`instantiate`](super::instantiate) is cached
//! here, keyed by the template, the entity it was built from (primary or a
//! partial specialization) and its argument list. Instances are also
//! indexed by their own hash so that a registered record or function can
//! be traced back to its instantiation.

use rustc_hash::{FxHashMap, FxHashSet};
use sema_core::{TemplateArg, TypeHash};

/// Lifecycle of a cached instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// Declared with substituted bases or signature, no definition yet.
    Pseudo,
    /// The definition was built. Terminal.
    Defined,
}

/// A cached template instance.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceRef {
    /// Hash of the registered record or function.
    pub hash: TypeHash,
    pub template: TypeHash,
    /// The partial specialization it was built from, if not the primary.
    pub specialization: Option<TypeHash>,
    pub args: Vec<TemplateArg>,
    pub state: InstanceState,
    /// A default argument fragment could not be parsed yet.
    pub delayed: bool,
}

impl InstanceRef {
    /// The template or specialization the instance was built from.
    pub fn entity(&self) -> TypeHash {
        self.specialization.unwrap_or(self.template)
    }

    pub fn is_defined(&self) -> bool {
        self.state == InstanceState::Defined
    }

    pub fn is_pseudo(&self) -> bool {
        self.state == InstanceState::Pseudo
    }
}

type InstanceKey = (TypeHash, TypeHash, Vec<TemplateArg>);

/// Cache for template instances.
///
/// Maps (template, entity, args) → instance.
#[derive(Debug, Default, Clone)]
pub struct TemplateInstanceCache {
    instances: FxHashMap<InstanceKey, InstanceRef>,
    /// Instance hash → key.
    by_hash: FxHashMap<TypeHash, InstanceKey>,
    /// Instances whose definition is being built right now.
    in_progress: FxHashSet<TypeHash>,
}

impl TemplateInstanceCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an instance.
    pub fn cache_instance(&mut self, instance: InstanceRef) {
        let key = (instance.template, instance.entity(), instance.args.clone());
        self.by_hash.insert(instance.hash, key.clone());
        self.instances.insert(key, instance);
    }

    /// Look up an instance of `entity` for `args`.
    pub fn get_instance(&self, template: TypeHash, entity: TypeHash, args: &[TemplateArg]) -> Option<&InstanceRef> {
        self.instances.get(&(template, entity, args.to_vec()))
    }

    /// Look up an instance by the hash of its record or function.
    pub fn lookup(&self, hash: TypeHash) -> Option<&InstanceRef> {
        self.by_hash.get(&hash).and_then(|key| self.instances.get(key))
    }

    fn lookup_mut(&mut self, hash: TypeHash) -> Option<&mut InstanceRef> {
        let key = self.by_hash.get(&hash)?;
        self.instances.get_mut(key)
    }

    /// Move an instance to [`InstanceState::Defined`].
    pub fn mark_defined(&mut self, hash: TypeHash) {
        if let Some(instance) = self.lookup_mut(hash) {
            instance.state = InstanceState::Defined;
        }
    }

    /// Record whether a default argument of the instance is still unparsed.
    pub fn set_delayed(&mut self, hash: TypeHash, delayed: bool) {
        if let Some(instance) = self.lookup_mut(hash) {
            instance.delayed = delayed;
        }
    }

    /// Drop an instance after a failed definition.
    pub fn remove(&mut self, hash: TypeHash) -> Option<InstanceRef> {
        self.in_progress.remove(&hash);
        let key = self.by_hash.remove(&hash)?;
        self.instances.remove(&key)
    }

    /// Mark the definition of `hash` as being built. Returns `false` if it
    /// already was.
    pub fn begin(&mut self, hash: TypeHash) -> bool {
        self.in_progress.insert(hash)
    }

    pub fn finish(&mut self, hash: TypeHash) {
        self.in_progress.remove(&hash);
    }

    pub fn is_in_progress(&self, hash: TypeHash) -> bool {
        self.in_progress.contains(&hash)
    }

    /// Get the number of cached instances.
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sema_core::Type;

    fn instance(template: TypeHash, arg: Type) -> InstanceRef {
        let args = vec![TemplateArg::Type(arg)];
        let hashes: Vec<TypeHash> = args.iter().map(TemplateArg::type_hash).collect();
        InstanceRef {
            hash: TypeHash::from_template_instance(template, &hashes),
            template,
            specialization: None,
            args,
            state: InstanceState::Pseudo,
            delayed: false,
        }
    }

    #[test]
    fn cache_new_is_empty() {
        let cache = TemplateInstanceCache::new();
        assert_eq!(cache.instance_count(), 0);
    }

    #[test]
    fn cache_and_lookup() {
        let mut cache = TemplateInstanceCache::new();
        let tpl = TypeHash::from_template("Box");
        let inst = instance(tpl, Type::int());
        let hash = inst.hash;
        cache.cache_instance(inst);

        assert!(cache.get_instance(tpl, tpl, &[TemplateArg::Type(Type::int())]).is_some());
        assert!(cache.get_instance(tpl, tpl, &[TemplateArg::Type(Type::double())]).is_none());
        assert_eq!(cache.lookup(hash).map(|i| i.state), Some(InstanceState::Pseudo));

        cache.mark_defined(hash);
        assert!(cache.lookup(hash).is_some_and(InstanceRef::is_defined));
        assert_eq!(cache.instance_count(), 1);
    }

    #[test]
    fn entity_is_part_of_the_key() {
        let mut cache = TemplateInstanceCache::new();
        let tpl = TypeHash::from_template("Box");
        let spec = TypeHash::from_template("Box<T*>");
        let mut inst = instance(tpl, Type::pointer_to(Type::int()));
        inst.specialization = Some(spec);
        cache.cache_instance(inst);

        let args = [TemplateArg::Type(Type::pointer_to(Type::int()))];
        assert!(cache.get_instance(tpl, spec, &args).is_some());
        assert!(cache.get_instance(tpl, tpl, &args).is_none());
    }

    #[test]
    fn remove_and_progress() {
        let mut cache = TemplateInstanceCache::new();
        let tpl = TypeHash::from_template("Box");
        let inst = instance(tpl, Type::int());
        let hash = inst.hash;
        cache.cache_instance(inst);

        assert!(cache.begin(hash));
        assert!(!cache.begin(hash));
        assert!(cache.is_in_progress(hash));
        cache.finish(hash);
        assert!(!cache.is_in_progress(hash));

        assert!(cache.remove(hash).is_some());
        assert!(cache.lookup(hash).is_none());
        assert_eq!(cache.instance_count(), 0);
    }
}
