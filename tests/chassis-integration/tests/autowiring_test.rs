//! 自动装配的集成测试：按类型注入、集合注入、错误归因、
//! 依赖环检测、获取顺序与逆序销毁

use chassis_abstractions::{
    Autowired, Context, ContextExt, Injected, InjectedAll, InjectionPoint, PreDestroy,
    Registration,
};
use chassis_impl::{default_context, StandardLifecycle};
use chassis_abstractions::LookupExt;
use parking_lot::Mutex;
use std::sync::Arc;

trait Repository: Send + Sync {
    fn save(&self);
}

#[derive(Default)]
struct MemoryRepository {
    saved: Mutex<usize>,
}

impl Repository for MemoryRepository {
    fn save(&self) {
        *self.saved.lock() += 1;
    }
}

struct CrudService {
    repository: Injected<dyn Repository>,
}

impl Autowired for CrudService {
    fn injection_points(&self) -> Vec<InjectionPoint<'_>> {
        vec![self.repository.point("repository")]
    }
}

#[test]
fn test_interface_autowiring() {
    let ctx = default_context().expect("容器创建失败");

    let repository = Arc::new(MemoryRepository::default());
    let service = Arc::new(CrudService {
        repository: Injected::new(),
    });

    ctx.install(
        Registration::from_arc(Arc::clone(&repository)).expose::<dyn Repository>(|c| c),
    )
    .expect("注册失败");
    ctx.install(Registration::from_arc(Arc::clone(&service)).with_autowiring())
        .expect("注册失败");

    ctx.start().expect("启动失败");

    // 注入的是同一个实例，且可用
    service.repository.get().expect("未注入").save();
    assert_eq!(*repository.saved.lock(), 1);
}

#[derive(Debug)]
struct Settings {
    name: &'static str,
}

struct NamedService {
    settings: Injected<Settings>,
}

impl Autowired for NamedService {
    fn injection_points(&self) -> Vec<InjectionPoint<'_>> {
        vec![self.settings.point("settings")]
    }
}

#[test]
fn test_concrete_type_autowiring() {
    let ctx = default_context().expect("容器创建失败");

    let service = Arc::new(NamedService {
        settings: Injected::new(),
    });
    ctx.register_component(Settings { name: "demo" })
        .expect("注册失败");
    ctx.install(Registration::from_arc(Arc::clone(&service)).with_autowiring())
        .expect("注册失败");

    ctx.start().expect("启动失败");

    assert_eq!(service.settings.get().expect("未注入").name, "demo");
}

#[test]
fn test_missing_dependency_fails_with_attribution() {
    let ctx = default_context().expect("容器创建失败");

    let service = Arc::new(CrudService {
        repository: Injected::new(),
    });
    ctx.install(Registration::from_arc(service).with_autowiring())
        .expect("注册失败");

    let error = ctx.start().expect_err("启动应当失败");
    let message = error.to_string();
    assert!(message.contains("CrudService"), "{message}");
    assert!(message.contains("repository"), "{message}");
    assert!(message.contains("Repository"), "{message}");
    assert!(message.contains("未找到匹配的组件"), "{message}");
}

trait Greeter: Send + Sync {
    fn greet(&self) -> &'static str;
}

struct English;

impl Greeter for English {
    fn greet(&self) -> &'static str {
        "hello"
    }
}

struct French;

impl Greeter for French {
    fn greet(&self) -> &'static str {
        "bonjour"
    }
}

struct Greeting {
    greeter: Injected<dyn Greeter>,
}

impl Autowired for Greeting {
    fn injection_points(&self) -> Vec<InjectionPoint<'_>> {
        vec![self.greeter.point("greeter")]
    }
}

#[test]
fn test_ambiguous_dependency_fails_with_count() {
    let ctx = default_context().expect("容器创建失败");

    ctx.install(Registration::new(English).expose::<dyn Greeter>(|c| c))
        .expect("注册失败");
    ctx.install(Registration::new(French).expose::<dyn Greeter>(|c| c))
        .expect("注册失败");
    ctx.install(
        Registration::new(Greeting {
            greeter: Injected::new(),
        })
        .with_autowiring(),
    )
    .expect("注册失败");

    let error = ctx.start().expect_err("启动应当失败");
    let message = error.to_string();
    assert!(message.contains("组件匹配不唯一"), "{message}");
    assert!(message.contains("实际 2 个"), "{message}");
}

struct AllGreeters {
    greeters: InjectedAll<dyn Greeter>,
}

impl Autowired for AllGreeters {
    fn injection_points(&self) -> Vec<InjectionPoint<'_>> {
        vec![self.greeters.point("greeters")]
    }
}

#[test]
fn test_collection_injection_in_registry_order() {
    let ctx = default_context().expect("容器创建失败");

    let all = Arc::new(AllGreeters {
        greeters: InjectedAll::new(),
    });
    ctx.install(Registration::from_arc(Arc::clone(&all)).with_autowiring())
        .expect("注册失败");
    ctx.install(Registration::new(English).expose::<dyn Greeter>(|c| c))
        .expect("注册失败");
    ctx.install(Registration::new(French).expose::<dyn Greeter>(|c| c))
        .expect("注册失败");

    ctx.start().expect("启动失败");

    let greetings: Vec<&'static str> = all.greeters.iter().map(|g| g.greet()).collect();
    assert_eq!(greetings, vec!["hello", "bonjour"]);
}

#[test]
fn test_collection_injection_with_zero_matches_is_empty_not_error() {
    let ctx = default_context().expect("容器创建失败");

    let all = Arc::new(AllGreeters {
        greeters: InjectedAll::new(),
    });
    ctx.install(Registration::from_arc(Arc::clone(&all)).with_autowiring())
        .expect("注册失败");

    ctx.start().expect("零匹配的集合注入不应失败");

    assert_eq!(all.greeters.get().expect("槽未装配").len(), 0);
}

/* 依赖环: A -> B -> C -> A */

struct ClassA {
    b: Injected<ClassB>,
}

struct ClassB {
    c: Injected<ClassC>,
}

struct ClassC {
    a: Injected<ClassA>,
}

impl Autowired for ClassA {
    fn injection_points(&self) -> Vec<InjectionPoint<'_>> {
        vec![self.b.point("b")]
    }
}

impl Autowired for ClassB {
    fn injection_points(&self) -> Vec<InjectionPoint<'_>> {
        vec![self.c.point("c")]
    }
}

impl Autowired for ClassC {
    fn injection_points(&self) -> Vec<InjectionPoint<'_>> {
        vec![self.a.point("a")]
    }
}

#[test]
fn test_circular_dependency_is_detected() {
    let ctx = default_context().expect("容器创建失败");

    ctx.install(
        Registration::new(ClassA {
            b: Injected::new(),
        })
        .with_autowiring(),
    )
    .expect("注册失败");
    ctx.install(
        Registration::new(ClassB {
            c: Injected::new(),
        })
        .with_autowiring(),
    )
    .expect("注册失败");
    ctx.install(
        Registration::new(ClassC {
            a: Injected::new(),
        })
        .with_autowiring(),
    )
    .expect("注册失败");

    let error = ctx.start().expect_err("依赖环必须被发现");
    let message = error.to_string();
    assert!(message.contains("检测到循环依赖"), "{message}");
    // 归因链覆盖环上的每一跳
    assert!(message.contains("ClassA"), "{message}");
    assert!(message.contains("ClassB"), "{message}");
    assert!(message.contains("ClassC"), "{message}");
}

/* 获取顺序与逆序销毁 */

#[derive(Default)]
struct DestroyLog {
    entries: Mutex<Vec<&'static str>>,
}

struct Base {
    log: Arc<DestroyLog>,
}

impl PreDestroy for Base {
    fn pre_destroy(&self) {
        self.log.entries.lock().push("A");
    }
}

struct FirstUser {
    base: Injected<Base>,
    log: Arc<DestroyLog>,
}

impl Autowired for FirstUser {
    fn injection_points(&self) -> Vec<InjectionPoint<'_>> {
        vec![self.base.point("base")]
    }
}

impl PreDestroy for FirstUser {
    fn pre_destroy(&self) {
        self.log.entries.lock().push("B");
    }
}

struct SecondUser {
    base: Injected<Base>,
    log: Arc<DestroyLog>,
}

impl Autowired for SecondUser {
    fn injection_points(&self) -> Vec<InjectionPoint<'_>> {
        vec![self.base.point("base")]
    }
}

impl PreDestroy for SecondUser {
    fn pre_destroy(&self) {
        self.log.entries.lock().push("C");
    }
}

#[test]
fn test_acquisition_order_and_reverse_teardown() {
    let ctx = default_context().expect("容器创建失败");
    let log = Arc::new(DestroyLog::default());

    ctx.install(
        Registration::new(Base {
            log: Arc::clone(&log),
        })
        .with_pre_destroy(),
    )
    .expect("注册失败");
    ctx.install(
        Registration::new(FirstUser {
            base: Injected::new(),
            log: Arc::clone(&log),
        })
        .with_autowiring()
        .with_pre_destroy(),
    )
    .expect("注册失败");
    ctx.install(
        Registration::new(SecondUser {
            base: Injected::new(),
            log: Arc::clone(&log),
        })
        .with_autowiring()
        .with_pre_destroy(),
    )
    .expect("注册失败");

    ctx.start().expect("启动失败");

    // 获取顺序与注册顺序一致：依赖（A）先于其使用者完成解析
    let lifecycle = ctx.resolve::<StandardLifecycle>().expect("协调器解析失败");
    let user_order: Vec<String> = lifecycle
        .acquisition_order()
        .iter()
        .map(|r| r.type_info().short_name().to_string())
        .filter(|n| ["Base", "FirstUser", "SecondUser"].contains(&n.as_str()))
        .collect();
    assert_eq!(user_order, vec!["Base", "FirstUser", "SecondUser"]);

    ctx.stop().expect("停止失败");

    // 销毁顺序是获取顺序的精确逆序：使用者严格先于其依赖被销毁
    assert_eq!(log.entries.lock().clone(), vec!["C", "B", "A"]);
}

/// 菱形依赖：两个使用者共享同一依赖，依赖只解析一次
#[test]
fn test_diamond_dependency_resolves_once() {
    let ctx = default_context().expect("容器创建失败");
    let log = Arc::new(DestroyLog::default());

    ctx.install(
        Registration::new(FirstUser {
            base: Injected::new(),
            log: Arc::clone(&log),
        })
        .with_autowiring(),
    )
    .expect("注册失败");
    ctx.install(
        Registration::new(SecondUser {
            base: Injected::new(),
            log: Arc::clone(&log),
        })
        .with_autowiring(),
    )
    .expect("注册失败");
    ctx.install(
        Registration::new(Base {
            log: Arc::clone(&log),
        })
        .with_pre_destroy(),
    )
    .expect("注册失败");

    ctx.start().expect("启动失败");

    let lifecycle = ctx.resolve::<StandardLifecycle>().expect("协调器解析失败");
    let base_count = lifecycle
        .acquisition_order()
        .iter()
        .filter(|r| r.type_info().short_name() == "Base")
        .count();
    assert_eq!(base_count, 1);
}
