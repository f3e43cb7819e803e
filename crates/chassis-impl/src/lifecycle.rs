//! 生命周期协调器
//!
//! [`StandardLifecycle`] 把每个组件驱动过 prepare → ready 两个阶段
//! 恰好一次：对一个组件先跑完全部观察者的 prepare 钩子，再跑 ready
//! 钩子。组件完成解析的先后构成获取顺序，销毁时逆序回放，保证
//! 依赖比依赖者活得久。
//!
//! 状态表按记录身份（uuid）键控，而不是按值相等性——两个内容
//! 相同的组件仍是两条独立记录。

use crate::context::MutableContext;
use chassis_abstractions::{
    ComponentConfigurer, ComponentLookup, ComponentRecord, Context, ContextAware, ContextObserver,
    LifecycleObserver, LifecycleState, PostInit, PreDestroy, PreInit, Registration,
    RegistrationObserver,
};
use chassis_common::{ContextError, ContextResult, DependencyError};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, error, info};
use uuid::Uuid;

/// 标准生命周期协调器
///
/// 以普通组件的身份注册进容器，通过能力绑定同时扮演：
/// 上下文感知组件、注册观察者（收集生命周期观察者）、
/// 容器事件观察者（驱动启动/停止）、组件配置器、组件查找器。
pub struct StandardLifecycle {
    ctx: OnceCell<Weak<MutableContext>>,
    observers: RwLock<Vec<Arc<dyn LifecycleObserver>>>,
    component_states: RwLock<HashMap<Uuid, LifecycleState>>,
    component_order: RwLock<Vec<Arc<ComponentRecord>>>,
}

impl StandardLifecycle {
    /// 创建新的协调器
    pub fn new() -> Self {
        Self {
            ctx: OnceCell::new(),
            observers: RwLock::new(Vec::new()),
            component_states: RwLock::new(HashMap::new()),
            component_order: RwLock::new(Vec::new()),
        }
    }

    /// 带全部能力绑定的注册定义
    pub fn registration(self) -> Registration<Self> {
        Registration::new(self)
            .with_context_aware()
            .expose::<dyn RegistrationObserver>(|c| c)
            .expose::<dyn ContextObserver>(|c| c)
            .expose::<dyn ComponentConfigurer>(|c| c)
            .expose::<dyn ComponentLookup>(|c| c)
    }

    /// 获取顺序快照（解析完成的先后）
    pub fn acquisition_order(&self) -> Vec<Arc<ComponentRecord>> {
        self.component_order.read().clone()
    }

    /// 查询记录当前的生命周期状态
    pub fn state_of(&self, record: &Arc<ComponentRecord>) -> LifecycleState {
        self.component_states
            .read()
            .get(&record.id())
            .copied()
            .unwrap_or_default()
    }

    /// 记录是否属于本协调器所在容器的注册表
    pub fn owns(&self, record: &Arc<ComponentRecord>) -> ContextResult<bool> {
        Ok(self.context()?.contains(record))
    }

    fn context(&self) -> ContextResult<Arc<MutableContext>> {
        self.ctx
            .get()
            .and_then(Weak::upgrade)
            .ok_or(ContextError::ContextDropped)
    }

    fn destroy_component(&self, record: &Arc<ComponentRecord>) {
        debug!(component = %record.type_info(), "销毁组件");
        let observers: Vec<Arc<dyn LifecycleObserver>> = self.observers.read().clone();
        for observer in &observers {
            // 销毁是尽力而为：失败只记录，不阻断其余组件的释放
            if let Err(error) = observer.on_destroy(record) {
                error!(component = %record.type_info(), %error, "销毁钩子失败");
            }
        }
    }
}

impl Default for StandardLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StandardLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardLifecycle")
            .field("observers", &self.observers.read().len())
            .field("configured", &self.component_order.read().len())
            .finish()
    }
}

impl ContextAware for StandardLifecycle {
    fn set_context(&self, ctx: Arc<dyn Context>) -> ContextResult<()> {
        let concrete = ctx
            .as_any()
            .downcast::<MutableContext>()
            .map_err(|_| ContextError::UnsupportedContextType {
                expected: "MutableContext".to_string(),
            })?;
        self.ctx
            .set(Arc::downgrade(&concrete))
            .map_err(|_| ContextError::setup_error("容器句柄重复设置"))
    }
}

impl RegistrationObserver for StandardLifecycle {
    fn on_component_registered(&self, record: &Arc<ComponentRecord>) {
        if let Some(observer) = record.capability::<dyn LifecycleObserver>() {
            self.observers.write().push(observer);
        }
    }
}

impl ContextObserver for StandardLifecycle {
    fn on_context_start(&self, records: &[Arc<ComponentRecord>]) -> ContextResult<()> {
        for record in records {
            self.configure_component(record)?;
        }
        info!(
            components = records.len(),
            processors = self.observers.read().len(),
            "生命周期启动完成"
        );
        Ok(())
    }

    fn on_context_stop(&self, _records: &[Arc<ComponentRecord>]) -> ContextResult<()> {
        let order = self.acquisition_order();
        for record in order.iter().rev() {
            let first_destruction = {
                let mut states = self.component_states.write();
                match states.get(&record.id()) {
                    Some(LifecycleState::Resolved) => {
                        states.insert(record.id(), LifecycleState::Destroyed);
                        true
                    }
                    _ => false,
                }
            };
            if first_destruction {
                self.destroy_component(record);
            }
        }
        Ok(())
    }
}

impl ComponentConfigurer for StandardLifecycle {
    fn configure_component(&self, record: &Arc<ComponentRecord>) -> ContextResult<()> {
        {
            let mut states = self.component_states.write();
            match states.get(&record.id()).copied().unwrap_or_default() {
                LifecycleState::Unconfigured => {
                    states.insert(record.id(), LifecycleState::Resolving);
                }
                LifecycleState::Resolving => {
                    return Err(DependencyError::CircularDependency {
                        type_name: record.type_info().name.clone(),
                    }
                    .into());
                }
                LifecycleState::Resolved | LifecycleState::Destroyed => return Ok(()),
            }
        }
        debug!(component = %record.type_info(), "开始配置组件");

        // 回调可能重入（自动装配递归配置依赖），观察者表取快照后在锁外调用
        let observers: Vec<Arc<dyn LifecycleObserver>> = self.observers.read().clone();

        // 一个组件的 prepare 阶段对全部观察者完成后，才进入 ready 阶段
        for observer in &observers {
            observer.on_prepare(record)?;
        }
        for observer in &observers {
            observer.on_ready(record)?;
        }

        self.component_states
            .write()
            .insert(record.id(), LifecycleState::Resolved);
        self.component_order.write().push(Arc::clone(record));
        debug!(component = %record.type_info(), "组件配置完成");

        Ok(())
    }
}

impl ComponentLookup for StandardLifecycle {
    fn find_by_type_id(&self, query: TypeId) -> Vec<Arc<ComponentRecord>> {
        self.context()
            .map(|ctx| ctx.find_by_type_id(query))
            .unwrap_or_default()
    }
}

/// 两阶段初始化器
///
/// 内置生命周期观察者：组件自带的 `pre_init` 钩子在 prepare 阶段
/// 调用、`post_init` 在 ready 阶段调用、`pre_destroy` 在销毁阶段
/// 调用——普通组件由此参与生命周期而不必实现完整的观察者契约。
#[derive(Debug, Default)]
pub struct TwoPhaseInitializer;

impl TwoPhaseInitializer {
    /// 创建新的初始化器
    pub fn new() -> Self {
        Self
    }

    /// 带观察者能力绑定的注册定义
    pub fn registration(self) -> Registration<Self> {
        Registration::new(self).with_lifecycle_observer()
    }
}

impl LifecycleObserver for TwoPhaseInitializer {
    fn on_prepare(&self, record: &Arc<ComponentRecord>) -> ContextResult<()> {
        if let Some(hook) = record.capability::<dyn PreInit>() {
            hook.pre_init().map_err(|source| ContextError::HookFailed {
                component: record.type_info().name.clone(),
                phase: "pre_init",
                source,
            })?;
        }
        Ok(())
    }

    fn on_ready(&self, record: &Arc<ComponentRecord>) -> ContextResult<()> {
        if let Some(hook) = record.capability::<dyn PostInit>() {
            hook.post_init().map_err(|source| ContextError::HookFailed {
                component: record.type_info().name.clone(),
                phase: "post_init",
                source,
            })?;
        }
        Ok(())
    }

    fn on_destroy(&self, record: &Arc<ComponentRecord>) -> ContextResult<()> {
        if let Some(hook) = record.capability::<dyn PreDestroy>() {
            hook.pre_destroy();
        }
        Ok(())
    }
}
