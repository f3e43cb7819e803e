//! 父子容器分叉的集成测试

use chassis_abstractions::{
    Autowired, Context, ContextExt, Injected, InjectionPoint, Registration,
};
use chassis_impl::{default_context, fork_context};
use std::sync::Arc;

#[derive(Debug)]
struct Bean {
    value: &'static str,
}

struct BeanHolder {
    bean: Injected<Bean>,
}

impl Autowired for BeanHolder {
    fn injection_points(&self) -> Vec<InjectionPoint<'_>> {
        vec![self.bean.point("bean")]
    }
}

#[test]
fn test_child_resolves_parent_component() {
    let parent = default_context().expect("父容器创建失败");
    let bean = Arc::new(Bean { value: "parent" });
    parent
        .install(Registration::from_arc(Arc::clone(&bean)))
        .expect("注册失败");
    parent.start().expect("父容器启动失败");

    let child = fork_context(&parent).expect("分叉失败");
    let holder = Arc::new(BeanHolder {
        bean: Injected::new(),
    });
    child
        .install(Registration::from_arc(Arc::clone(&holder)).with_autowiring())
        .expect("注册失败");
    child.start().expect("子容器启动失败");

    // 仅存在于父容器的类型从子容器解析成功，且是同一个实例
    let wired = holder.bean.get().expect("未注入");
    assert!(Arc::ptr_eq(wired, &bean));

    child.stop().expect("子容器停止失败");
    parent.stop().expect("父容器停止失败");
}

#[test]
fn test_local_component_shadows_parent() {
    let parent = default_context().expect("父容器创建失败");
    parent
        .register_component(Bean { value: "parent" })
        .expect("注册失败");
    parent.start().expect("父容器启动失败");

    let child = fork_context(&parent).expect("分叉失败");
    let local = Arc::new(Bean { value: "child" });
    child
        .install(Registration::from_arc(Arc::clone(&local)))
        .expect("注册失败");
    let holder = Arc::new(BeanHolder {
        bean: Injected::new(),
    });
    child
        .install(Registration::from_arc(Arc::clone(&holder)).with_autowiring())
        .expect("注册失败");
    child.start().expect("子容器启动失败");

    // 两边都存在的类型解析到子容器本地实例
    let wired = holder.bean.get().expect("未注入");
    assert_eq!(wired.value, "child");
    assert!(Arc::ptr_eq(wired, &local));
}

#[test]
fn test_delegation_composes_across_levels() {
    let root = default_context().expect("根容器创建失败");
    let bean = Arc::new(Bean { value: "root" });
    root.install(Registration::from_arc(Arc::clone(&bean)))
        .expect("注册失败");
    root.start().expect("根容器启动失败");

    let middle = fork_context(&root).expect("一级分叉失败");
    middle.start().expect("中间容器启动失败");

    let leaf = fork_context(&middle).expect("二级分叉失败");
    let holder = Arc::new(BeanHolder {
        bean: Injected::new(),
    });
    leaf.install(Registration::from_arc(Arc::clone(&holder)).with_autowiring())
        .expect("注册失败");
    leaf.start().expect("叶容器启动失败");

    // 两级委托：叶容器一路问到根容器
    assert!(Arc::ptr_eq(holder.bean.get().expect("未注入"), &bean));
}

#[test]
fn test_fork_does_not_mutate_parent_registry() {
    let parent = default_context().expect("父容器创建失败");
    parent.start().expect("父容器启动失败");
    let before = parent.records().len();

    let child = fork_context(&parent).expect("分叉失败");
    child
        .register_component(Bean { value: "child-only" })
        .expect("注册失败");
    child.start().expect("子容器启动失败");

    // 分叉建立的是独立注册表，不是对父表的修改
    assert_eq!(parent.records().len(), before);
}
