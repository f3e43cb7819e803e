//! 容器与两阶段生命周期的集成测试

use chassis_abstractions::{
    Autowired, Context, ContextExt, Injected, InjectionPoint, LookupExt, PostInit, PreInit,
    Registration,
};
use chassis_impl::{default_context, standard_context, StandardLifecycle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[test]
fn test_empty_context_starts_and_stops() {
    let ctx = standard_context().expect("容器创建失败");
    ctx.start().expect("启动失败");
    ctx.stop().expect("停止失败");
}

/// 两阶段组件：pre_init 必须先于 post_init 完成
#[derive(Default)]
struct TwoPhaseService {
    phase1_done: AtomicBool,
    phase2_done: AtomicBool,
    bad_phase_order: AtomicBool,
}

impl PreInit for TwoPhaseService {
    fn pre_init(&self) -> Result<(), chassis_abstractions::HookError> {
        self.phase1_done.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl PostInit for TwoPhaseService {
    fn post_init(&self) -> Result<(), chassis_abstractions::HookError> {
        if !self.phase1_done.load(Ordering::SeqCst) {
            self.bad_phase_order.store(true, Ordering::SeqCst);
        }
        self.phase2_done.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_two_phase_lifecycle() {
    let ctx = default_context().expect("容器创建失败");

    let service = Arc::new(TwoPhaseService::default());
    ctx.install(
        Registration::from_arc(Arc::clone(&service))
            .with_pre_init()
            .with_post_init(),
    )
    .expect("注册失败");

    ctx.start().expect("启动失败");

    assert!(service.phase1_done.load(Ordering::SeqCst));
    assert!(service.phase2_done.load(Ordering::SeqCst));
    assert!(!service.bad_phase_order.load(Ordering::SeqCst));
}

/// 需要容器句柄的组件
struct CtxHolder {
    ctx: Injected<dyn Context>,
}

impl Autowired for CtxHolder {
    fn injection_points(&self) -> Vec<InjectionPoint<'_>> {
        vec![self.ctx.point("ctx")]
    }
}

#[test]
fn test_context_is_injectable_by_type() {
    let ctx = default_context().expect("容器创建失败");

    let holder = Arc::new(CtxHolder {
        ctx: Injected::new(),
    });
    ctx.install(Registration::from_arc(Arc::clone(&holder)).with_autowiring())
        .expect("注册失败");

    ctx.start().expect("启动失败");

    let handle = holder.ctx.get().expect("容器句柄未注入");
    handle.stop().expect("经句柄停止失败");
}

struct FailingService;

impl PreInit for FailingService {
    fn pre_init(&self) -> Result<(), chassis_abstractions::HookError> {
        Err("引导失败".into())
    }
}

#[test]
fn test_start_is_fail_fast() {
    let ctx = default_context().expect("容器创建失败");

    let late = Arc::new(TwoPhaseService::default());
    ctx.install(Registration::new(FailingService).with_pre_init())
        .expect("注册失败");
    ctx.install(
        Registration::from_arc(Arc::clone(&late))
            .with_pre_init()
            .with_post_init(),
    )
    .expect("注册失败");

    ctx.start().expect_err("启动应当失败");

    // 快速失败：后注册的组件未进入任何阶段
    assert!(!late.phase1_done.load(Ordering::SeqCst));
    assert!(!late.phase2_done.load(Ordering::SeqCst));
}

#[test]
fn test_every_component_resolves_exactly_once() {
    let ctx = default_context().expect("容器创建失败");
    ctx.register_component("component".to_string())
        .expect("注册失败");

    ctx.start().expect("启动失败");
    // 重复启动幂等：已解析组件不再进入获取顺序
    ctx.start().expect("重复启动失败");

    let lifecycle = ctx
        .resolve::<StandardLifecycle>()
        .expect("协调器解析失败");
    let order = lifecycle.acquisition_order();
    let strings = order
        .iter()
        .filter(|r| r.type_info().name.contains("String"))
        .count();
    assert_eq!(strings, 1);

    // 全部记录都达到 Resolved
    assert_eq!(order.len(), ctx.records().len());
}
