//! # Chassis 容器演示
//!
//! 演示容器的端到端用法：
//! - 按能力契约的自动装配（单值与集合注入）
//! - 标签元数据由调用方查询（容器本身不读标签）
//! - 两阶段初始化钩子, 含 ready 阶段拉起的后台任务
//! - 转换服务作为外部协作者经容器装配

use chassis_abstractions::{
    Autowired, ComponentDefinition, Context, ContextExt, Injected, InjectedAll, InjectionPoint,
    LookupExt, PostInit, PreDestroy, Registration,
};
use chassis_composition::{
    converter_fn, populate_from_modules, ComponentModule, ConversionService,
    ConversionServiceExt, Converter, FnConverter, GenericConversionService,
};
use chassis_impl::default_context;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// 投递设置
#[derive(Debug, Clone, Deserialize)]
struct DeliverySettings {
    sender: String,
    retries: u32,
}

/// 投递通道能力契约
trait Channel: Send + Sync {
    fn label(&self) -> &'static str;
    fn deliver(&self, message: &str);
}

struct EmailChannel;

impl Channel for EmailChannel {
    fn label(&self) -> &'static str {
        "email"
    }

    fn deliver(&self, message: &str) {
        info!(channel = self.label(), message, "投递消息");
    }
}

struct SmsChannel;

impl Channel for SmsChannel {
    fn label(&self) -> &'static str {
        "sms"
    }

    fn deliver(&self, message: &str) {
        info!(channel = self.label(), message, "投递消息");
    }
}

/// 消息分发器：把消息广播到全部已注册的通道
struct Dispatcher {
    channels: InjectedAll<dyn Channel>,
    settings: Injected<DeliverySettings>,
}

impl Dispatcher {
    fn new() -> Self {
        Self {
            channels: InjectedAll::new(),
            settings: Injected::new(),
        }
    }

    fn broadcast(&self, message: &str) {
        let sender = self
            .settings
            .get()
            .map_or("unknown", |s| s.sender.as_str());
        for channel in self.channels.iter() {
            channel.deliver(&format!("{sender}: {message}"));
        }
    }
}

impl Autowired for Dispatcher {
    fn injection_points(&self) -> Vec<InjectionPoint<'_>> {
        vec![
            self.channels.point("channels"),
            self.settings.point("settings"),
        ]
    }
}

impl PostInit for Dispatcher {
    fn post_init(&self) -> Result<(), chassis_abstractions::HookError> {
        // 后台心跳是组件自己的事务，容器从不等待它
        tokio::spawn(async {
            let mut ticker = tokio::time::interval(Duration::from_secs(30));
            loop {
                ticker.tick().await;
                info!("分发器心跳");
            }
        });
        info!(channels = self.channels.iter().count(), "分发器就绪");
        Ok(())
    }
}

impl PreDestroy for Dispatcher {
    fn pre_destroy(&self) {
        info!("分发器下线");
    }
}

type SettingsConverter = FnConverter<
    String,
    DeliverySettings,
    fn(&String) -> Result<DeliverySettings, Box<dyn std::error::Error + Send + Sync>>,
>;

fn settings_converter() -> SettingsConverter {
    converter_fn(|raw: &String| serde_json::from_str::<DeliverySettings>(raw).map_err(Into::into))
}

/// 应用组件模块
struct AppModule {
    email: Arc<EmailChannel>,
    sms: Arc<SmsChannel>,
    dispatcher: Arc<Dispatcher>,
    conversion: Arc<GenericConversionService>,
}

impl AppModule {
    fn new() -> Self {
        Self {
            email: Arc::new(EmailChannel),
            sms: Arc::new(SmsChannel),
            dispatcher: Arc::new(Dispatcher::new()),
            conversion: Arc::new(GenericConversionService::new()),
        }
    }
}

impl ComponentModule for AppModule {
    fn component_definitions(&self) -> Vec<ComponentDefinition> {
        vec![
            Registration::from_arc(Arc::clone(&self.email))
                .expose::<dyn Channel>(|c| c)
                .with_tags(r#"channel:"email" mvc:"route=/notify/email""#)
                .into_definition(),
            Registration::from_arc(Arc::clone(&self.sms))
                .expose::<dyn Channel>(|c| c)
                .with_tags(r#"channel:"sms" mvc:"route=/notify/sms""#)
                .into_definition(),
            Registration::from_arc(Arc::clone(&self.dispatcher))
                .with_autowiring()
                .with_post_init()
                .with_pre_destroy()
                .into_definition(),
            Registration::from_arc(Arc::clone(&self.conversion))
                .with_autowiring()
                .expose::<dyn ConversionService>(|c| c)
                .into_definition(),
            Registration::new(settings_converter())
                .expose::<dyn Converter>(|c| c)
                .into_definition(),
        ]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let module = AppModule::new();
    let ctx = default_context()?;

    // 分发器在 prepare 阶段就要解析设置，先于模块成员注册
    let settings: DeliverySettings =
        serde_json::from_str(r#"{"sender": "chassis", "retries": 3}"#)?;
    info!(?settings, "配置已解析");
    ctx.register_component(settings)?;

    populate_from_modules(&ctx, &[&module])?;
    ctx.start()?;

    module.dispatcher.broadcast("容器演示消息");

    // 转换服务此刻已从容器收集到贡献的转换器
    let conversion = ctx.resolve::<dyn ConversionService>()?;
    let parsed: DeliverySettings =
        conversion.convert_to(&r#"{"sender": "ops", "retries": 1}"#.to_string())?;
    info!(sender = %parsed.sender, retries = parsed.retries, "经转换服务解析的设置");

    // 标签只被调用方消费：按 mvc 标签列出可路由组件
    for record in ctx.find_by_type::<dyn Channel>() {
        if let Some(route) = record.tags().get("mvc") {
            info!(component = %record.type_info(), route, "可路由组件");
        }
    }

    ctx.stop()?;
    Ok(())
}
