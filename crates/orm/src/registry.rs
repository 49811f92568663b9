//! Model registry - ordered store of table metadata
//!
//! Models are registered once at startup, cross-linked by a single bootstrap
//! and then read concurrently. Registration and bootstrap take the write
//! lock; every read goes through a [`RegistryView`] holding the read lock.

use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use tracing::{debug, error, info, warn};

use crate::bootstrap::{self, BootstrapSummary};
use crate::config::OrmConfig;
use crate::descriptor::{Model, ModelDescriptor};
use crate::error::{LifecycleError, OrmError, OrmResult, RegistrationError, ResolutionError};
use crate::metadata::{FieldId, FieldInfo, ModelId, ModelInfo};
use crate::tags::{OrmTagParser, TagParser};

/// Registry contents guarded by the registry lock
#[derive(Debug, Default)]
pub(crate) struct ModelStore {
    /// Keyed by table name, in registration order
    pub(crate) models: IndexMap<String, ModelInfo>,
    pub(crate) by_full_name: HashMap<String, ModelId>,
    pub(crate) closed: bool,
    pub(crate) outcome: Option<Result<BootstrapSummary, ResolutionError>>,
}

impl ModelStore {
    pub(crate) fn insert(&mut self, mut mi: ModelInfo) -> ModelId {
        let id = ModelId(self.models.len());
        mi.id = id;
        self.by_full_name.insert(mi.full_name.clone(), id);
        self.models.insert(mi.table.clone(), mi);
        id
    }

    pub(crate) fn contains_table(&self, table: &str) -> bool {
        self.models.contains_key(table)
    }

    pub(crate) fn contains_full_name(&self, full_name: &str) -> bool {
        self.by_full_name.contains_key(full_name)
    }

    pub(crate) fn id_of(&self, full_name: &str) -> Option<ModelId> {
        self.by_full_name.get(full_name).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.models.len()
    }

    pub(crate) fn model(&self, id: ModelId) -> &ModelInfo {
        &self.models[id.0]
    }

    pub(crate) fn model_mut(&mut self, id: ModelId) -> &mut ModelInfo {
        &mut self.models[id.0]
    }

    pub(crate) fn field(&self, id: FieldId) -> &FieldInfo {
        &self.model(id.model).fields[id.index]
    }

    pub(crate) fn field_mut(&mut self, id: FieldId) -> &mut FieldInfo {
        &mut self.model_mut(id.model).fields[id.index]
    }

    fn clear(&mut self) {
        self.models.clear();
        self.by_full_name.clear();
        self.closed = false;
        self.outcome = None;
    }
}

/// Where a registration batch puts its table-name affix
#[derive(Debug, Clone, Copy)]
enum TableAffix<'a> {
    None,
    Prefix(&'a str),
    Suffix(&'a str),
}

impl TableAffix<'_> {
    fn apply(&self, table: String) -> String {
        match self {
            TableAffix::None => table,
            TableAffix::Prefix(prefix) => format!("{}{}", prefix, table),
            TableAffix::Suffix(suffix) => format!("{}{}", table, suffix),
        }
    }
}

/// Thread-safe store of every registered model
pub struct ModelRegistry {
    store: RwLock<ModelStore>,
    config: OrmConfig,
    parser: Box<dyn TagParser>,
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("store", &self.store)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry {
    /// Create an empty registry with default settings
    pub fn new() -> Self {
        Self::with_config(OrmConfig::default())
    }

    pub fn with_config(config: OrmConfig) -> Self {
        Self {
            store: RwLock::new(ModelStore::default()),
            config,
            parser: Box::new(OrmTagParser),
        }
    }

    /// Replace the field tag parser
    pub fn with_parser(mut self, parser: impl TagParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    pub fn config(&self) -> &OrmConfig {
        &self.config
    }

    /// Register a batch of models
    ///
    /// The batch is all-or-nothing: if any model is rejected none of them is
    /// added.
    pub fn register<I>(&self, models: I) -> OrmResult<()>
    where
        I: IntoIterator<Item = ModelDescriptor>,
    {
        self.register_with_affix(TableAffix::None, models)
    }

    /// Register a batch of models with `prefix` prepended to every table name
    pub fn register_with_prefix<I>(&self, prefix: &str, models: I) -> OrmResult<()>
    where
        I: IntoIterator<Item = ModelDescriptor>,
    {
        self.register_with_affix(TableAffix::Prefix(prefix), models)
    }

    /// Register a batch of models with `suffix` appended to every table name
    pub fn register_with_suffix<I>(&self, suffix: &str, models: I) -> OrmResult<()>
    where
        I: IntoIterator<Item = ModelDescriptor>,
    {
        self.register_with_affix(TableAffix::Suffix(suffix), models)
    }

    /// Register a single model type
    pub fn register_model<T: Model>(&self) -> OrmResult<()> {
        self.register([T::describe()])
    }

    fn register_with_affix<I>(&self, affix: TableAffix<'_>, models: I) -> OrmResult<()>
    where
        I: IntoIterator<Item = ModelDescriptor>,
    {
        let mut store = self.write();
        if store.closed {
            warn!("Rejected registration into a bootstrapped registry");
            return Err(LifecycleError::RegistryClosed.into());
        }

        let strategy = self.config.name_strategy;
        let mut pending: Vec<ModelInfo> = Vec::new();

        for desc in models {
            if desc.is_indirection() {
                return Err(RegistrationError::InvalidPointerKind(desc.type_name).into());
            }

            let (_, name) = desc.split_type_name();
            let table = desc
                .table_name
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| strategy.apply(name));
            let table = affix.apply(table);

            let taken = store.contains_full_name(&desc.type_name)
                || store.contains_table(&table)
                || pending
                    .iter()
                    .any(|mi| mi.full_name == desc.type_name || mi.table == table);
            if taken {
                warn!(
                    "Model `{}` (table `{}`) is already registered",
                    desc.type_name, table
                );
                return Err(RegistrationError::DuplicateModel {
                    full_name: desc.type_name,
                    table,
                }
                .into());
            }

            let mi = ModelInfo::from_descriptor(&desc, table, self.parser.as_ref(), strategy)?;
            pending.push(mi);
        }

        for mi in pending {
            debug!(
                "Registered model `{}` as table `{}` with {} fields",
                mi.full_name,
                mi.table,
                mi.fields.len()
            );
            store.insert(mi);
        }

        Ok(())
    }

    /// Resolve every relation of the registered models
    ///
    /// Runs once. The registry is closed afterwards whatever the outcome, and
    /// later calls return the first outcome without touching the graph.
    pub fn bootstrap(&self) -> OrmResult<BootstrapSummary> {
        let mut store = self.write();
        if let Some(outcome) = &store.outcome {
            return outcome.clone().map_err(OrmError::from);
        }

        store.closed = true;
        let outcome = bootstrap::run(&mut store);
        match &outcome {
            Ok(summary) => info!(
                "Bootstrapped {} models ({} junction tables, {} reverse fields synthesized)",
                summary.models, summary.junctions, summary.reverse_fields
            ),
            Err(e) => error!("Model bootstrap failed: {}", e),
        }
        store.outcome = Some(outcome.clone());
        outcome.map_err(OrmError::from)
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.read().outcome.is_some()
    }

    /// Read access to the registered models
    pub fn view(&self) -> RegistryView<'_> {
        RegistryView { store: self.read() }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every model and reopen the registry
    pub fn reset(&self) {
        self.write().clear();
        debug!("Model registry reset");
    }

    fn read(&self) -> RwLockReadGuard<'_, ModelStore> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ModelStore> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Read-locked view of a registry
pub struct RegistryView<'a> {
    store: RwLockReadGuard<'a, ModelStore>,
}

impl<'a> RegistryView<'a> {
    /// Lookup by table name
    pub fn get(&self, table: &str) -> Option<&ModelInfo> {
        self.store.models.get(table)
    }

    /// Lookup by full type name
    pub fn get_by_full_name(&self, full_name: &str) -> Option<&ModelInfo> {
        self.store.id_of(full_name).map(|id| self.store.model(id))
    }

    pub fn get_by_type<T: Model>(&self) -> Option<&ModelInfo> {
        self.get_by_full_name(std::any::type_name::<T>())
    }

    pub fn model(&self, id: ModelId) -> Option<&ModelInfo> {
        self.store.models.get_index(id.0).map(|(_, mi)| mi)
    }

    pub fn field(&self, id: FieldId) -> Option<&FieldInfo> {
        self.model(id.model).and_then(|mi| mi.fields.at(id.index))
    }

    /// Models in registration order, synthesized junctions included
    pub fn all_ordered(&self) -> impl Iterator<Item = &ModelInfo> {
        self.store.models.values()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.models.is_empty()
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.store.outcome.is_some()
    }

    /// Error recorded by a failed bootstrap
    pub fn bootstrap_error(&self) -> Option<&ResolutionError> {
        self.store.outcome.as_ref().and_then(|o| o.as_ref().err())
    }
}

/// Global registry instance for the application
static GLOBAL_REGISTRY: OnceLock<ModelRegistry> = OnceLock::new();

/// Get the global model registry, configured from the environment
pub fn global_registry() -> &'static ModelRegistry {
    GLOBAL_REGISTRY.get_or_init(|| match OrmConfig::from_env() {
        Ok(config) => ModelRegistry::with_config(config),
        Err(e) => {
            warn!("Ignoring invalid ORM environment configuration: {}", e);
            ModelRegistry::new()
        }
    })
}

/// Register models in the global registry
pub fn register_model<I>(models: I) -> OrmResult<()>
where
    I: IntoIterator<Item = ModelDescriptor>,
{
    global_registry().register(models)
}

/// Register models in the global registry with a table-name prefix
pub fn register_model_with_prefix<I>(prefix: &str, models: I) -> OrmResult<()>
where
    I: IntoIterator<Item = ModelDescriptor>,
{
    global_registry().register_with_prefix(prefix, models)
}

/// Register models in the global registry with a table-name suffix
pub fn register_model_with_suffix<I>(suffix: &str, models: I) -> OrmResult<()>
where
    I: IntoIterator<Item = ModelDescriptor>,
{
    global_registry().register_with_suffix(suffix, models)
}

/// Empty the global registry; meant for tests
pub fn reset_model_cache() {
    global_registry().reset();
}

/// Register model types in one batch
///
/// `register_models!(registry => User, Post)` targets an explicit registry,
/// `register_models!(User, Post)` the global one.
#[macro_export]
macro_rules! register_models {
    ($registry:expr => $($model:ty),+ $(,)?) => {
        $registry.register([$(<$model as $crate::descriptor::Model>::describe()),+])
    };
    ($($model:ty),+ $(,)?) => {
        $crate::registry::register_model([$(<$model as $crate::descriptor::Model>::describe()),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldDescriptor;
    use crate::naming::NameStrategy;
    use crate::tags::ParsedTag;
    use serial_test::serial;

    /// `key, size=2` style tags
    struct KeyValueParser;

    impl TagParser for KeyValueParser {
        fn parse(&self, raw: &str) -> ParsedTag {
            raw.split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .fold(ParsedTag::new(), |tag, token| match token.split_once('=') {
                    Some((key, value)) => tag.with_value(key.trim(), value.trim()),
                    None if token == "key" => tag.with_flag("pk"),
                    None => tag.with_flag(token),
                })
        }
    }

    fn simple(type_name: &str) -> ModelDescriptor {
        ModelDescriptor::new(type_name)
            .field(FieldDescriptor::of::<i64>("id", ""))
            .field(FieldDescriptor::of::<String>("name", ""))
    }

    #[test]
    fn test_registry_creation() {
        let registry = ModelRegistry::new();
        assert!(registry.is_empty());
        assert!(!registry.is_bootstrapped());
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = ModelRegistry::new();
        registry
            .register([simple("app::UserProfile"), simple("app::Post")])
            .unwrap();

        let view = registry.view();
        assert_eq!(view.len(), 2);
        let profile = view.get("user_profile").unwrap();
        assert_eq!(profile.full_name, "app::UserProfile");
        assert_eq!(profile.id, ModelId(0));
        assert_eq!(view.get_by_full_name("app::Post").unwrap().table, "post");

        let order: Vec<_> = view.all_ordered().map(|mi| mi.table.as_str()).collect();
        assert_eq!(order, vec!["user_profile", "post"]);
    }

    #[test]
    fn test_table_name_override_and_affixes() {
        let registry = ModelRegistry::new();
        registry
            .register_with_prefix("blog_", [simple("app::Post")])
            .unwrap();
        registry
            .register_with_suffix("_v2", [simple("app::Comment").table("remarks")])
            .unwrap();

        let view = registry.view();
        assert!(view.get("blog_post").is_some());
        assert!(view.get("remarks_v2").is_some());
    }

    #[test]
    fn test_name_strategy_applies_to_tables() {
        let config = OrmConfig::new().with_name_strategy(NameStrategy::SnakeAcronym);
        let registry = ModelRegistry::with_config(config);
        registry.register([simple("app::HTTPLog")]).unwrap();
        assert!(registry.view().get("http_log").is_some());
    }

    #[test]
    fn test_custom_tag_parser() {
        let registry = ModelRegistry::new().with_parser(KeyValueParser);
        registry
            .register([ModelDescriptor::new("app::Country")
                .field(FieldDescriptor::of::<i64>("id", ""))
                .field(FieldDescriptor::of::<String>("code", "key, size=2"))
                .field(FieldDescriptor::of::<String>("name", "null, column=label"))])
            .unwrap();

        let view = registry.view();
        let country = view.get("country").unwrap();
        let code = country.pk().unwrap();
        assert_eq!(code.name, "code");
        assert_eq!(code.size, 2);
        assert!(!country.fields.get("id").unwrap().pk);

        let name = country.fields.get("name").unwrap();
        assert!(name.null);
        assert_eq!(name.column, "label");
    }

    #[test]
    fn test_duplicate_table_leaves_registry_unchanged() {
        let registry = ModelRegistry::new();
        registry.register([simple("app::User")]).unwrap();

        let err = registry
            .register([simple("app::Post"), simple("other::User")])
            .unwrap_err();
        assert_eq!(
            err,
            OrmError::Registration(RegistrationError::DuplicateModel {
                full_name: "other::User".to_string(),
                table: "user".to_string(),
            })
        );

        let view = registry.view();
        assert_eq!(view.len(), 1);
        assert!(view.get("post").is_none());
    }

    #[test]
    fn test_duplicate_full_name() {
        let registry = ModelRegistry::new();
        registry.register([simple("app::User")]).unwrap();
        let err = registry
            .register([simple("app::User").table("people")])
            .unwrap_err();
        assert!(matches!(
            err,
            OrmError::Registration(RegistrationError::DuplicateModel { .. })
        ));
    }

    #[test]
    fn test_duplicate_within_batch() {
        let registry = ModelRegistry::new();
        let err = registry
            .register([simple("app::User"), simple("app::User")])
            .unwrap_err();
        assert!(matches!(
            err,
            OrmError::Registration(RegistrationError::DuplicateModel { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_invalid_pointer_kind() {
        let registry = ModelRegistry::new();
        let err = registry
            .register([simple("&app::User")])
            .unwrap_err();
        assert_eq!(
            err,
            OrmError::Registration(RegistrationError::InvalidPointerKind("&app::User".to_string()))
        );
    }

    #[test]
    fn test_registration_after_bootstrap_is_rejected() {
        let registry = ModelRegistry::new();
        registry.register([simple("app::User")]).unwrap();
        registry.bootstrap().unwrap();

        let err = registry.register([simple("app::Post")]).unwrap_err();
        assert_eq!(err, OrmError::Lifecycle(LifecycleError::RegistryClosed));
    }

    #[test]
    fn test_reset_reopens_registry() {
        let registry = ModelRegistry::new();
        registry.register([simple("app::User")]).unwrap();
        registry.bootstrap().unwrap();

        registry.reset();
        assert!(registry.is_empty());
        assert!(!registry.is_bootstrapped());
        registry.register([simple("app::User")]).unwrap();
    }

    #[test]
    #[serial]
    fn test_global_registry() {
        reset_model_cache();
        register_model([simple("global::User")]).unwrap();
        register_model_with_prefix("x_", [simple("global::Post")]).unwrap();
        register_model_with_suffix("_y", [simple("global::Tag")]).unwrap();

        {
            let view = global_registry().view();
            assert!(view.get("user").is_some());
            assert!(view.get("x_post").is_some());
            assert!(view.get("tag_y").is_some());
        }

        reset_model_cache();
        assert!(global_registry().is_empty());
    }
}
