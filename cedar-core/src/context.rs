use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

type Component = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
struct ComponentSet {
    entries: Vec<(String, TypeId, Component)>,
}

impl ComponentSet {
    fn insert<T: Send + Sync + 'static>(&mut self, bean_name: String, value: T) {
        let type_id = TypeId::of::<T>();
        let component: Component = Arc::new(value);
        match self
            .entries
            .iter_mut()
            .find(|(name, id, _)| *name == bean_name && *id == type_id)
        {
            Some(entry) => entry.2 = component,
            None => self.entries.push((bean_name, type_id, component)),
        }
    }

    fn collect<T: Clone + 'static>(&self, out: &mut Vec<(String, T)>) {
        for (name, _, component) in &self.entries {
            if let Some(value) = component.downcast_ref::<T>() {
                out.push((name.clone(), value.clone()));
            }
        }
    }

    fn first<T: Clone + 'static>(&self) -> Option<T> {
        self.entries
            .iter()
            .find_map(|(_, _, component)| component.downcast_ref::<T>().cloned())
    }
}

/// 按客户端名称隔离的组件注册表
///
/// 每个名称拥有独立的组件集合，同时继承一份所有名称共享的默认集合。
/// 组件按类型查找，同一集合内按注册顺序返回
#[derive(Default)]
pub struct NamedContexts {
    defaults: RwLock<ComponentSet>,
    contexts: RwLock<HashMap<String, ComponentSet>>,
}

impl NamedContexts {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为指定客户端注册组件，同名同类型的组件会被替换
    pub fn register<T: Send + Sync + 'static>(
        &self,
        name: &str,
        bean_name: impl Into<String>,
        value: T,
    ) {
        let bean_name = bean_name.into();
        tracing::debug!("Registered component '{}' for client '{}'", bean_name, name);
        self.contexts
            .write()
            .entry(name.to_string())
            .or_default()
            .insert(bean_name, value);
    }

    /// 注册所有客户端共享的组件
    pub fn register_default<T: Send + Sync + 'static>(&self, bean_name: impl Into<String>, value: T) {
        let bean_name = bean_name.into();
        tracing::debug!("Registered default component '{}'", bean_name);
        self.defaults.write().insert(bean_name, value);
    }

    /// 获取一个组件，先查客户端自身的集合，再查默认集合
    pub fn get_instance<T: Clone + 'static>(&self, name: &str) -> Option<T> {
        self.get_instance_without_ancestors(name)
            .or_else(|| self.defaults.read().first::<T>())
    }

    /// 获取某类型的全部组件，默认集合在前
    pub fn get_instances<T: Clone + 'static>(&self, name: &str) -> Vec<(String, T)> {
        let mut out = Vec::new();
        self.defaults.read().collect(&mut out);
        if let Some(set) = self.contexts.read().get(name) {
            set.collect(&mut out);
        }
        out
    }

    pub fn get_instance_without_ancestors<T: Clone + 'static>(&self, name: &str) -> Option<T> {
        self.contexts.read().get(name).and_then(ComponentSet::first::<T>)
    }

    pub fn get_instances_without_ancestors<T: Clone + 'static>(
        &self,
        name: &str,
    ) -> Vec<(String, T)> {
        let mut out = Vec::new();
        if let Some(set) = self.contexts.read().get(name) {
            set.collect(&mut out);
        }
        out
    }

    pub fn context_names(&self) -> Vec<String> {
        self.contexts.read().keys().cloned().collect()
    }
}
