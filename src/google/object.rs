use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::core::object::{TypedParameter, UntypedObject};

use super::parameters::State;

/// Keys serialized from the object identity, never from its fields.
pub(crate) const IDENTITY_KEYS: [&str; 2] = ["id", "classId"];

/// A Wallet Objects resource type.
pub trait WalletObject: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Path segment of the REST resource, e.g. `genericObject`.
    const RESOURCE: &'static str;
    /// Key of the save-link payload listing objects of this type, e.g. `genericObjects`.
    const SAVE_KEY: &'static str;

    fn id(&self) -> &str;

    fn class_id(&self) -> &str;
}

/// A Generic pass object.
///
/// Every key other than `id` and `classId` is kept in [fields](GenericObject::fields).
/// Identity keys found in `fields` are dropped by [GenericObject::new].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericObject {
    id: String,
    #[serde(rename = "classId")]
    class_id: String,
    #[serde(flatten)]
    fields: UntypedObject,
}

impl GenericObject {
    pub fn new(
        id: impl Into<String>,
        class_id: impl Into<String>,
        mut fields: UntypedObject,
    ) -> Self {
        fields
            .0
            .retain(|key, _| !IDENTITY_KEYS.contains(&key.as_str()));
        Self {
            id: id.into(),
            class_id: class_id.into(),
            fields,
        }
    }

    pub fn fields(&self) -> &UntypedObject {
        &self.fields
    }

    /// The object state; objects without one are `ACTIVE`.
    pub fn state(&self) -> anyhow::Result<State> {
        self.fields.get_or_default()
    }

    /// Get a known field, see [UntypedObject::get].
    pub fn get<T: TypedParameter>(&self) -> Option<anyhow::Result<T>> {
        self.fields.get()
    }
}

impl WalletObject for GenericObject {
    const RESOURCE: &'static str = "genericObject";
    const SAVE_KEY: &'static str = "genericObjects";

    fn id(&self) -> &str {
        &self.id
    }

    fn class_id(&self) -> &str {
        &self.class_id
    }
}
