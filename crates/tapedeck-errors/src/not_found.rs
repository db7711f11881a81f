//! Not-found errors and the client hint that points at the listing call

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

/// Hint naming the client call that lists available resources
///
/// Renders as `Use 'client.files.list()' to list available Files.`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientListCommand {
    command: String,
    arguments: Vec<String>,
    resource_name_plural: Option<String>,
}

impl ClientListCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            arguments: Vec::new(),
            resource_name_plural: None,
        }
    }

    /// Arguments shown inside the call parentheses, quoted
    #[must_use]
    pub fn with_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments = arguments.into_iter().map(Into::into).collect();
        self
    }

    /// Plural label for the "to list available ..." suffix
    #[must_use]
    pub fn listing(mut self, resource_name_plural: impl Into<String>) -> Self {
        self.resource_name_plural = Some(resource_name_plural.into());
        self
    }
}

impl fmt::Display for ClientListCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args = self
            .arguments
            .iter()
            .map(|arg| format!("\"{arg}\""))
            .collect::<Vec<_>>()
            .join(", ");

        write!(f, "Use 'client.{}({args})'", self.command)?;
        if let Some(ref plural) = self.resource_name_plural {
            write!(f, " to list available {plural}")?;
        }
        f.write_str(".")
    }
}

/// A requested resource does not exist
///
/// The message is assembled once, at construction, from structured
/// identifiers:
/// `{resource_type} '{resource_name}' not found[ in {parent}]. [Use 'client.{cmd}(...)' to list available {plural}.]`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ResourceNotFound {
    type_name: Cow<'static, str>,
    resource_name: String,
    resource_type: String,
    message: String,
}

impl ResourceNotFound {
    /// Start building a not-found error for a resource of the given type
    pub fn builder(resource_name: impl Into<String>, resource_type: impl Into<String>) -> ResourceNotFoundBuilder {
        ResourceNotFoundBuilder {
            type_name: Cow::Borrowed("ResourceNotFoundError"),
            resource_name: resource_name.into(),
            resource_type: resource_type.into(),
            client_command: None,
            command_arguments: Vec::new(),
            resource_name_plural: None,
            parent_resource: None,
        }
    }

    /// Not-found error for an untyped resource
    pub fn resource(resource_name: impl Into<String>) -> Self {
        Self::builder(resource_name, "Resource").build()
    }

    pub fn model(model_name: impl Into<String>) -> Self {
        Self::builder(model_name, "Model")
            .named("ModelNotFoundError")
            .client_command("models.list")
            .build()
    }

    pub fn vector_store(vector_store_name: impl Into<String>) -> Self {
        Self::builder(vector_store_name, "Vector Store")
            .named("VectorStoreNotFoundError")
            .client_command("vector_dbs.list")
            .build()
    }

    pub fn dataset(dataset_name: impl Into<String>) -> Self {
        Self::builder(dataset_name, "Dataset")
            .named("DatasetNotFoundError")
            .client_command("datasets.list")
            .build()
    }

    pub fn tool_group(toolgroup_name: impl Into<String>) -> Self {
        Self::builder(toolgroup_name, "Tool Group")
            .named("ToolGroupNotFoundError")
            .client_command("toolgroups.list")
            .build()
    }

    /// Conversations have no listing call, so no hint is added
    pub fn conversation(conversation_id: impl Into<String>) -> Self {
        Self::builder(conversation_id, "Conversation")
            .named("ConversationNotFoundError")
            .build()
    }

    pub fn conversation_item(item_id: impl Into<String>, conversation_id: &str) -> Self {
        Self::builder(item_id, "Conversation item")
            .named("ConversationItemNotFoundError")
            .client_command("conversations.items.list")
            .command_arguments([conversation_id])
            .plural("conversation items")
            .in_parent(format!("conversation '{conversation_id}'"))
            .build()
    }

    pub fn connector(connector_id: impl Into<String>) -> Self {
        Self::builder(connector_id, "Connector")
            .named("ConnectorNotFoundError")
            .client_command("connectors.list")
            .build()
    }

    pub fn connector_tool(connector_id: &str, tool_name: &str) -> Self {
        Self::builder(format!("{connector_id}.{tool_name}"), "Connector Tool")
            .named("ConnectorToolNotFoundError")
            .client_command("connectors.list_tools")
            .command_arguments([connector_id])
            .build()
    }

    pub fn file(file_id: impl Into<String>) -> Self {
        Self::builder(file_id, "File")
            .named("OpenAIFileObjectNotFoundError")
            .client_command("files.list")
            .build()
    }

    pub fn batch(batch_id: impl Into<String>) -> Self {
        Self::builder(batch_id, "Batch")
            .named("BatchNotFoundError")
            .client_command("batches.list")
            .plural("batches")
            .build()
    }

    pub fn response(response_id: impl Into<String>) -> Self {
        Self::builder(response_id, "Response")
            .named("ResponseNotFoundError")
            .client_command("responses.list")
            .build()
    }

    pub fn response_input_item(item_id: impl Into<String>, response_id: &str) -> Self {
        Self::builder(item_id, "Input item")
            .named("ResponseInputItemNotFoundError")
            .client_command("responses.input_items.list")
            .command_arguments([response_id])
            .plural("input items")
            .in_parent(format!("response '{response_id}'"))
            .build()
    }

    /// Class name of the concrete not-found error, e.g. `ModelNotFoundError`
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Builder for [`ResourceNotFound`]
#[derive(Debug, Clone)]
#[must_use]
pub struct ResourceNotFoundBuilder {
    type_name: Cow<'static, str>,
    resource_name: String,
    resource_type: String,
    client_command: Option<String>,
    command_arguments: Vec<String>,
    resource_name_plural: Option<String>,
    parent_resource: Option<String>,
}

impl ResourceNotFoundBuilder {
    /// Class name reported for this error
    pub fn named(mut self, type_name: impl Into<Cow<'static, str>>) -> Self {
        self.type_name = type_name.into();
        self
    }

    /// Listing call to suggest, e.g. `files.list`
    pub fn client_command(mut self, command: impl Into<String>) -> Self {
        self.client_command = Some(command.into());
        self
    }

    /// Arguments for the listing call
    pub fn command_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command_arguments = arguments.into_iter().map(Into::into).collect();
        self
    }

    /// Plural label, for resource types whose plural is not `{type}s`
    pub fn plural(mut self, resource_name_plural: impl Into<String>) -> Self {
        self.resource_name_plural = Some(resource_name_plural.into());
        self
    }

    /// Parent context for nested resources, e.g. `conversation 'conv_1'`
    pub fn in_parent(mut self, parent_resource: impl Into<String>) -> Self {
        self.parent_resource = Some(parent_resource.into());
        self
    }

    pub fn build(self) -> ResourceNotFound {
        let Self {
            type_name,
            resource_name,
            resource_type,
            client_command,
            command_arguments,
            resource_name_plural,
            parent_resource,
        } = self;

        let mut message = match parent_resource {
            Some(parent) => format!("{resource_type} '{resource_name}' not found in {parent}."),
            None => format!("{resource_type} '{resource_name}' not found."),
        };

        if let Some(command) = client_command {
            let plural = resource_name_plural.unwrap_or_else(|| format!("{resource_type}s"));
            let hint = ClientListCommand::new(command)
                .with_arguments(command_arguments)
                .listing(plural);
            message.push(' ');
            message.push_str(&hint.to_string());
        }

        ResourceNotFound {
            type_name,
            resource_name,
            resource_type,
            message,
        }
    }
}
