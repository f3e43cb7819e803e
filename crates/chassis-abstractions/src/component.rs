//! 组件记录与注册定义
//!
//! 组件记录是注册进容器的实例连同其类型描述符、标签表和能力绑定表。
//! 记录一经创建即不可变，由所属注册表持有整个生命周期，只被引用、
//! 从不复制。

use crate::context::ContextAware;
use crate::injection::Autowired;
use crate::lifecycle::{LifecycleObserver, PostInit, PreDestroy, PreInit};
use chassis_common::{TagSet, TypeInfo};
use chrono::{DateTime, Utc};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// 能力绑定
///
/// 组件注册时声明的一条"本组件满足某能力契约"的事实。
/// 载荷的具体类型是 `Arc<Q>`，其中 `Q` 为能力契约类型
/// （trait object 或组件自身的具体类型）。
#[derive(Clone)]
pub struct CapabilityBinding {
    target: TypeInfo,
    payload: Arc<dyn Any + Send + Sync>,
}

impl CapabilityBinding {
    /// 创建新的能力绑定；`payload` 的具体类型必须是 `Arc<Q>`
    /// 且 `target` 必须描述 `Q`，由 [`Registration`] 保证
    pub fn new(target: TypeInfo, payload: Arc<dyn Any + Send + Sync>) -> Self {
        Self { target, payload }
    }

    /// 绑定指向的能力契约
    pub fn target(&self) -> &TypeInfo {
        &self.target
    }

    /// 取回类型化的能力句柄
    pub fn downcast<Q: ?Sized + 'static>(&self) -> Option<Arc<Q>> {
        self.payload.downcast_ref::<Arc<Q>>().cloned()
    }
}

impl fmt::Debug for CapabilityBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityBinding")
            .field("target", &self.target.name)
            .finish_non_exhaustive()
    }
}

/// 类型擦除后的组件注册定义
///
/// 由 [`Registration`] 构建，交给容器的 `register` 消费。
pub struct ComponentDefinition {
    instance: Arc<dyn Any + Send + Sync>,
    type_info: TypeInfo,
    tags: TagSet,
    bindings: Vec<CapabilityBinding>,
}

impl ComponentDefinition {
    /// 组件的具体类型信息
    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    /// 固化为组件记录，分配身份标识与注册时间戳
    pub fn into_record(self) -> ComponentRecord {
        ComponentRecord {
            id: Uuid::new_v4(),
            type_info: self.type_info,
            tags: self.tags,
            registered_at: Utc::now(),
            instance: self.instance,
            bindings: self.bindings,
        }
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("type_info", &self.type_info.name)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

/// 组件记录
///
/// 身份即记录的 `id`（按身份而非值相等性区分：两个内容相同的组件
/// 仍是两条记录）。生命周期状态由协调器在记录之外维护。
pub struct ComponentRecord {
    id: Uuid,
    type_info: TypeInfo,
    tags: TagSet,
    registered_at: DateTime<Utc>,
    instance: Arc<dyn Any + Send + Sync>,
    bindings: Vec<CapabilityBinding>,
}

impl ComponentRecord {
    /// 记录身份标识
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 组件的具体类型信息
    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    /// 组件标签表
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// 注册时间
    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// 类型擦除的组件实例
    pub fn instance(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.instance
    }

    /// 运行时类型是否满足查询的能力契约
    pub fn satisfies(&self, query: TypeId) -> bool {
        self.bindings.iter().any(|b| b.target.id == query)
    }

    /// 按能力契约查询绑定
    pub fn capability_binding(&self, query: TypeId) -> Option<&CapabilityBinding> {
        self.bindings.iter().find(|b| b.target.id == query)
    }

    /// 取回类型化的能力句柄
    pub fn capability<Q: ?Sized + 'static>(&self) -> Option<Arc<Q>> {
        self.capability_binding(TypeId::of::<Q>())
            .and_then(CapabilityBinding::downcast::<Q>)
    }
}

impl fmt::Debug for ComponentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRecord")
            .field("id", &self.id)
            .field("type_info", &self.type_info.name)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

/// 组件注册构建器
///
/// 自动携带"自身具体类型"的能力绑定；其余能力契约通过
/// [`expose`](Registration::expose) 逐条声明。
pub struct Registration<T: Send + Sync + 'static> {
    instance: Arc<T>,
    tags: TagSet,
    bindings: Vec<CapabilityBinding>,
}

impl<T: Send + Sync + 'static> Registration<T> {
    /// 以新实例创建注册
    pub fn new(instance: T) -> Self {
        Self::from_arc(Arc::new(instance))
    }

    /// 以共享实例创建注册（声明式装配需要在模块与容器间共享实例）
    pub fn from_arc(instance: Arc<T>) -> Self {
        let self_binding =
            CapabilityBinding::new(TypeInfo::of::<T>(), Arc::new(Arc::clone(&instance)));
        Self {
            instance,
            tags: TagSet::default(),
            bindings: vec![self_binding],
        }
    }

    /// 附加标签串
    #[must_use]
    pub fn with_tags(mut self, raw: &str) -> Self {
        self.tags = TagSet::parse(raw);
        self
    }

    /// 声明组件满足能力契约 `Q`
    ///
    /// `upcast` 仅做无捕获的指针上转换，例如 `|c| c`（借助 unsized
    /// coercion 把 `Arc<T>` 变为 `Arc<dyn Capability>`）。
    #[must_use]
    pub fn expose<Q: ?Sized + Send + Sync + 'static>(
        mut self,
        upcast: fn(Arc<T>) -> Arc<Q>,
    ) -> Self {
        let payload = upcast(Arc::clone(&self.instance));
        self.bindings
            .push(CapabilityBinding::new(TypeInfo::of::<Q>(), Arc::new(payload)));
        self
    }

    /// 擦除为注册定义
    pub fn into_definition(self) -> ComponentDefinition {
        ComponentDefinition {
            instance: self.instance,
            type_info: TypeInfo::of::<T>(),
            tags: self.tags,
            bindings: self.bindings,
        }
    }
}

impl<T: Autowired + Send + Sync + 'static> Registration<T> {
    /// 声明组件参与自动装配
    #[must_use]
    pub fn with_autowiring(self) -> Self {
        self.expose::<dyn Autowired>(|c| c)
    }
}

impl<T: ContextAware + Send + Sync + 'static> Registration<T> {
    /// 声明组件需要在注册时获得容器句柄
    #[must_use]
    pub fn with_context_aware(self) -> Self {
        self.expose::<dyn ContextAware>(|c| c)
    }
}

impl<T: PreInit + Send + Sync + 'static> Registration<T> {
    /// 声明组件的 prepare 阶段初始化钩子
    #[must_use]
    pub fn with_pre_init(self) -> Self {
        self.expose::<dyn PreInit>(|c| c)
    }
}

impl<T: PostInit + Send + Sync + 'static> Registration<T> {
    /// 声明组件的 ready 阶段初始化钩子
    #[must_use]
    pub fn with_post_init(self) -> Self {
        self.expose::<dyn PostInit>(|c| c)
    }
}

impl<T: PreDestroy + Send + Sync + 'static> Registration<T> {
    /// 声明组件的销毁钩子
    #[must_use]
    pub fn with_pre_destroy(self) -> Self {
        self.expose::<dyn PreDestroy>(|c| c)
    }
}

impl<T: LifecycleObserver + Send + Sync + 'static> Registration<T> {
    /// 声明组件本身是一个生命周期观察者
    #[must_use]
    pub fn with_lifecycle_observer(self) -> Self {
        self.expose::<dyn LifecycleObserver>(|c| c)
    }
}
