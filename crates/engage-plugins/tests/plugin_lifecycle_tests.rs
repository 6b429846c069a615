//! Integration tests for the plugin host lifecycle

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use engage_core::{
    Client, ClientConfig, ClientHandle, Event, EventHandler, EventKind, InteractionContext,
};
use engage_plugins::{
    LifecycleState, ManagedPlugin, Plugin, PluginBase, PluginHost, PluginInfo, PluginRegistry,
};

type Events = Arc<Mutex<Vec<String>>>;

/// Writes the interaction's `segment` parameter into the client profile on
/// activation and records every hook.
#[derive(Debug)]
struct SegmentPlugin {
    base: PluginBase,
    events: Events,
}

impl SegmentPlugin {
    fn record(&self, hook: &str) {
        let id = self.base.context().interaction_id().unwrap_or_default();
        self.events.lock().unwrap().push(format!("{}:{}", hook, id));
    }
}

#[async_trait]
impl Plugin for SegmentPlugin {
    fn base(&self) -> &PluginBase {
        &self.base
    }

    async fn on_activate(&mut self) {
        self.record("activate");
        let segment = self.base.context().first_parameter("segment").map(str::to_string);
        if let (Some(client), Some(segment)) = (self.base.client().upgrade(), segment) {
            client.add_profile_value("segments", &segment).await;
        }
    }

    async fn on_dispose(&mut self) {
        self.record("dispose");
    }
}

/// Listens for clicks while active, keyed by its interaction id.
#[derive(Debug)]
struct ClickListener {
    base: PluginBase,
    clicks: Events,
}

#[async_trait]
impl Plugin for ClickListener {
    fn base(&self) -> &PluginBase {
        &self.base
    }

    async fn on_activate(&mut self) {
        let (Some(client), Some(id)) = (
            self.base.client().upgrade(),
            self.base.context().interaction_id(),
        ) else {
            return;
        };
        let clicks = self.clicks.clone();
        let handler: EventHandler = Arc::new(move |event: &Event| {
            if let EventKind::Click { selector } = event.kind() {
                clicks.lock().unwrap().push(selector.clone());
            }
        });
        client.events().subscribe("ClickEvent", id, handler).await;
    }

    async fn on_dispose(&mut self) {
        if let Some(client) = self.base.client().upgrade() {
            client
                .events()
                .clear_event_handlers(self.base.context().interaction_id())
                .await;
        }
    }
}

fn info(name: &str) -> PluginInfo {
    PluginInfo {
        name: name.to_string(),
        description: "Adds the visitor to a segment".to_string(),
        interaction_types: vec!["segment".to_string()],
    }
}

async fn setup(events: &Events) -> PluginHost {
    let client = Arc::new(Client::new(ClientConfig::new(
        "https://example.engage.io/",
        "ShopApp",
    )));
    client.set_locale("nl_NL").await;

    let registry = PluginRegistry::new();
    let events = events.clone();
    registry
        .register(info("ShopApp.Segment"), move |client, context| SegmentPlugin {
            base: PluginBase::new(client, context),
            events: events.clone(),
        })
        .await
        .unwrap();

    PluginHost::new(client, registry)
}

fn interactions() -> serde_json::Value {
    json!({
        "result": {
            "interactions": [
                {
                    "id": "101",
                    "pluginClass": "Plugins.Segment",
                    "myInteractionTypeId": "segment",
                    "position": "#header",
                    "defaultLocale": "en_US",
                    "parameters": [
                        { "locale": "en_US", "parameter": [ { "id": "segment", "value": ["shoppers"] } ] },
                        { "locale": "nl_NL", "parameter": [ { "id": "segment", "value": ["kopers"] } ] }
                    ]
                },
                {
                    "id": "102",
                    "pluginClass": "Plugins.Segment",
                    "myInteractionTypeId": "segment",
                    "position": "#footer",
                    "defaultLocale": "en_US",
                    "parameters": [
                        { "locale": "en_US", "parameter": [ { "id": "segment", "value": ["returning"] } ] }
                    ]
                },
                {
                    "id": "103",
                    "pluginClass": "Plugins.Carousel",
                    "myInteractionTypeId": "carousel"
                }
            ],
            "connections": [
                { "id": "crm", "parameters": [
                    { "locale": "en_US", "parameter": [ { "id": "endpoint", "value": ["https://crm.example.com"] } ] }
                ] }
            ]
        }
    })
}

#[tokio::test]
async fn test_full_lifecycle_through_page_views() {
    let events: Events = Arc::default();
    let mut host = setup(&events).await;

    let activated = host.apply_interactions(&interactions()).await.unwrap();
    assert_eq!(activated, 2);

    // Locale block for nl_NL on the first, default locale fallback on the second
    let mut segments = host.client().profile_values("segments").await.unwrap();
    segments.sort();
    assert_eq!(segments, vec!["kopers".to_string(), "returning".to_string()]);

    let current = host.current();
    assert_eq!(current.len(), 2);
    assert!(current.iter().all(|plugin| plugin.class_name == "ShopApp.Segment"));

    let properties = HashMap::from([("screenName".to_string(), "Cart".to_string())]);
    assert_eq!(host.page_view(Some(&properties), None).await, 2);
    assert_eq!(host.client().screen_name().await, "Cart");
    assert_eq!(host.dispose_all().await, 0);

    assert_eq!(
        *events.lock().unwrap(),
        vec![
            "activate:101",
            "activate:102",
            "dispose:101",
            "dispose:102"
        ]
    );
}

#[tokio::test]
async fn test_plugins_see_connections_through_their_context() {
    let events: Events = Arc::default();
    let mut host = setup(&events).await;
    host.apply_interactions(&interactions()).await.unwrap();

    let context = InteractionContext::new("101", "segment", "#header")
        .with_client(ClientHandle::new(host.client()));
    let connection = context.connection("crm").await.unwrap();
    assert_eq!(
        connection.parameter("endpoint"),
        Some(&["https://crm.example.com".to_string()][..])
    );
    assert!(context.connection("missing").await.is_none());

    host.dispose_all().await;
}

#[tokio::test]
async fn test_plugin_outliving_client_sees_detached_handle() {
    let events: Events = Arc::default();
    let client = Arc::new(Client::new(ClientConfig::new(
        "https://example.engage.io",
        "ShopApp",
    )));
    let mut plugin = ManagedPlugin::new(
        "ShopApp.Segment",
        Box::new(SegmentPlugin {
            base: PluginBase::new(
                ClientHandle::new(&client),
                Arc::new(InteractionContext::new("7", "segment", "top")),
            ),
            events: events.clone(),
        }),
    );

    assert!(plugin.plugin().base().client().ptr_eq(&client));
    drop(client);

    plugin.activate().await.unwrap();
    plugin.dispose().await.unwrap();
    assert_eq!(plugin.state(), LifecycleState::Disposed);
    assert!(!plugin.plugin().base().client().is_attached());
    assert_eq!(*events.lock().unwrap(), vec!["activate:7", "dispose:7"]);
}

#[tokio::test]
async fn test_construction_runs_no_hooks() {
    let events: Events = Arc::default();
    let host = setup(&events).await;

    let (name, factory) = host
        .registry()
        .resolve("Plugins.Segment", "ShopApp")
        .await
        .unwrap();
    assert_eq!(name, "ShopApp.Segment");

    let plugin = factory(
        ClientHandle::new(host.client()),
        Arc::new(InteractionContext::new("1", "banner", "top")),
    );
    assert!(plugin.base().client().ptr_eq(host.client()));
    assert_eq!(plugin.base().context().interaction_type(), Some("banner"));
    assert_eq!(plugin.base().context().position_identifier(), Some("top"));
    assert!(plugin.base().context().parameters().is_empty());
    assert!(events.lock().unwrap().is_empty());
    assert!(host.client().profile_values("segments").await.is_none());
}

#[tokio::test]
async fn test_host_accepts_raw_json() {
    let events: Events = Arc::default();
    let mut host = setup(&events).await;

    let body = serde_json::to_string(&interactions()).unwrap();
    assert_eq!(host.apply_interactions_json(&body).await.unwrap(), 2);
    assert!(host.apply_interactions_json("{\"result\": 5}").await.is_err());
    assert_eq!(host.current().len(), 2);

    host.dispose_all().await;
}

#[tokio::test]
async fn test_plugins_share_the_client_event_bus() {
    let clicks: Events = Arc::default();
    let client = Arc::new(Client::new(ClientConfig::new(
        "https://example.engage.io",
        "ShopApp",
    )));
    let registry = PluginRegistry::new();
    let sink = clicks.clone();
    registry
        .register(info("ClickListener"), move |client, context| ClickListener {
            base: PluginBase::new(client, context),
            clicks: sink.clone(),
        })
        .await
        .unwrap();
    let mut host = PluginHost::new(client, registry);

    let home = HashMap::from([("screenName".to_string(), "home".to_string())]);
    host.page_view(Some(&home), None).await;
    host.client()
        .publish_event(EventKind::Click {
            selector: "#hero".to_string(),
        })
        .await;

    // Queued click is replayed on activation
    host.apply_interactions(&json!({ "result": { "interactions": [
        { "id": "201", "pluginClass": "Plugins.ClickListener", "myInteractionTypeId": "listener" }
    ] } }))
    .await
    .unwrap();
    host.client()
        .publish_event(EventKind::Click {
            selector: "#buy".to_string(),
        })
        .await;
    assert_eq!(*clicks.lock().unwrap(), vec!["#hero", "#buy"]);

    host.page_view(Some(&home), None).await;
    assert_eq!(host.client().events().listener_count("ClickEvent").await, 0);

    host.client()
        .publish_event(EventKind::Click {
            selector: "#late".to_string(),
        })
        .await;
    assert_eq!(clicks.lock().unwrap().len(), 2);
}
