//! CSDL JSON importer
//!
//! Reads an OData 4.01 JSON metadata document into [`SchemaDocument`]s.
//! Inline annotations (`"@Core.Description": ...` inside an element, or
//! `"Member@Term"` beside it) are lifted into `Annotations` elements whose
//! target is the annotated element's path, so annotation dispatch sees a
//! single representation. Term aliases declared by `$Reference`/`$Include`
//! and schema `$Alias` are expanded to full namespaces.

use crate::import::{ImportError, ImportResult};
use crate::models::{
    Annotation, Annotations, EntityContainer, EntitySet, EntityType, EnumType, EnumTypeMember,
    Facets, NavigationProperty, Operation, OperationImport, Parameter, Property,
    ReferentialConstraintPair, SchemaDocument, Singleton,
};
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Parser for CSDL JSON metadata documents.
#[derive(Default)]
pub struct CsdlJsonImporter;

/// Alias table and warnings collected while parsing one document
#[derive(Default)]
struct ParseContext {
    aliases: HashMap<String, String>,
    warnings: Vec<ImportError>,
}

impl ParseContext {
    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(ImportError::Unsupported(message));
    }

    /// Expand an aliased term (`Core.Description`) to its namespace.
    fn resolve_term(&self, term: &str) -> String {
        match term.rsplit_once('.') {
            Some((prefix, name)) => match self.aliases.get(prefix) {
                Some(namespace) => format!("{}.{}", namespace, name),
                None => term.to_string(),
            },
            None => term.to_string(),
        }
    }

    /// Expand an aliased type name, keeping `Collection(...)` wrappers.
    fn resolve_type(&self, type_name: &str) -> String {
        match type_name
            .strip_prefix("Collection(")
            .and_then(|inner| inner.strip_suffix(')'))
        {
            Some(inner) => format!("Collection({})", self.resolve_term(inner)),
            None => self.resolve_term(type_name),
        }
    }
}

/// Inline annotations grouped by target path, in first-seen order
#[derive(Default)]
struct LiftedAnnotations {
    elements: Vec<Annotations>,
}

impl LiftedAnnotations {
    fn push(&mut self, target: &str, annotation: Annotation) {
        match self.elements.iter_mut().find(|e| e.target == target) {
            Some(element) => element.annotations.push(annotation),
            None => self
                .elements
                .push(Annotations::new(target).with_annotation(annotation)),
        }
    }

    /// Lift every `@Term` key of `object` onto `target`.
    fn lift_from(&mut self, target: &str, object: &Map<String, Value>, context: &ParseContext) {
        for (key, value) in object {
            if let Some(annotation) = key
                .strip_prefix('@')
                .and_then(|term| parse_annotation(term, value, context))
            {
                self.push(target, annotation);
            }
        }
    }
}

/// Expression kind for a JSON annotation value
fn expression_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Bool(_) => "Bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "Int",
        Value::Number(_) => "Float",
        Value::String(_) => "String",
        Value::Array(_) => "Collection",
        Value::Object(map) if map.contains_key("$Path") => "Path",
        Value::Object(_) => "Record",
    }
}

/// Parse `Term#Qualifier` (without the leading `@`) and its value.
///
/// Annotations on annotations (`Term@Other`) are skipped.
fn parse_annotation(key: &str, value: &Value, context: &ParseContext) -> Option<Annotation> {
    if key.contains('@') {
        debug!("Skipping nested annotation @{}", key);
        return None;
    }
    let (term, qualifier) = match key.split_once('#') {
        Some((term, qualifier)) => (term, Some(qualifier)),
        None => (key, None),
    };
    let mut annotation = Annotation::new(context.resolve_term(term))
        .with_value(expression_kind(value), value.clone());
    if let Some(qualifier) = qualifier {
        annotation = annotation.with_qualifier(qualifier);
    }
    Some(annotation)
}

fn str_field<'v>(object: &'v Map<String, Value>, key: &str) -> Option<&'v str> {
    object.get(key).and_then(Value::as_str)
}

fn bool_field(object: &Map<String, Value>, key: &str) -> Option<bool> {
    object.get(key).and_then(Value::as_bool)
}

/// `$Type` (default `Edm.String`) wrapped in `Collection(...)` when `$Collection` is set
fn declared_type(object: &Map<String, Value>, context: &ParseContext) -> String {
    let base = context.resolve_type(str_field(object, "$Type").unwrap_or("Edm.String"));
    if bool_field(object, "$Collection").unwrap_or(false) {
        format!("Collection({})", base)
    } else {
        base
    }
}

impl CsdlJsonImporter {
    /// Create a new CSDL JSON importer instance.
    ///
    /// # Example
    ///
    /// ```rust
    /// use odata_metadata_sdk::import::csdl_json::CsdlJsonImporter;
    ///
    /// let importer = CsdlJsonImporter::new();
    /// ```
    pub fn new() -> Self {
        Self
    }

    /// Import a CSDL JSON document.
    ///
    /// # Example
    ///
    /// ```rust
    /// use odata_metadata_sdk::import::csdl_json::CsdlJsonImporter;
    ///
    /// let document = r#"{
    ///   "$Version": "4.01",
    ///   "Demo": {
    ///     "Product": {
    ///       "$Kind": "EntityType",
    ///       "$Key": ["ID"],
    ///       "ID": {"$Type": "Edm.Int32", "$Nullable": false}
    ///     }
    ///   }
    /// }"#;
    /// let result = CsdlJsonImporter::new().import(document).unwrap();
    /// assert_eq!(result.schemas[0].entity_types[0].key, vec!["ID"]);
    /// ```
    pub fn import(&self, content: &str) -> Result<ImportResult, ImportError> {
        self.parse(content)
            .map_err(|e| ImportError::ParseError(format!("{:#}", e)))
    }

    fn parse(&self, content: &str) -> Result<ImportResult> {
        let document: Value =
            serde_json::from_str(content).context("Failed to parse CSDL document as JSON")?;
        let root = document
            .as_object()
            .context("CSDL document must be a JSON object")?;

        let mut context = ParseContext::default();
        let mut references = Vec::new();
        if let Some(refs) = root.get("$Reference").and_then(Value::as_object) {
            for (uri, reference) in refs {
                references.push(uri.clone());
                let includes = reference
                    .get("$Include")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten();
                for include in includes {
                    let namespace = include
                        .get("$Namespace")
                        .and_then(Value::as_str)
                        .with_context(|| format!("$Include of {} lacks $Namespace", uri))?;
                    if let Some(alias) = include.get("$Alias").and_then(Value::as_str) {
                        context
                            .aliases
                            .insert(alias.to_string(), namespace.to_string());
                    }
                }
            }
        }
        for (namespace, body) in root.iter().filter(|(k, _)| !k.starts_with('$')) {
            if let Some(alias) = body.get("$Alias").and_then(Value::as_str) {
                context
                    .aliases
                    .insert(alias.to_string(), namespace.clone());
            }
        }

        let mut schemas = Vec::new();
        for (namespace, body) in root.iter().filter(|(k, _)| !k.starts_with('$')) {
            let body = body
                .as_object()
                .with_context(|| format!("Schema {} must be a JSON object", namespace))?;
            let schema = self
                .parse_schema(namespace, body, &mut context)
                .with_context(|| format!("Failed to parse schema {}", namespace))?;
            schemas.push(schema);
        }

        info!("Imported {} schemas from CSDL JSON", schemas.len());
        Ok(ImportResult {
            version: str_field(root, "$Version").map(str::to_string),
            entity_container: str_field(root, "$EntityContainer").map(str::to_string),
            references,
            schemas,
            errors: context.warnings,
        })
    }

    fn parse_schema(
        &self,
        namespace: &str,
        body: &Map<String, Value>,
        context: &mut ParseContext,
    ) -> Result<SchemaDocument> {
        let mut schema = SchemaDocument::new(namespace);
        schema.alias = str_field(body, "$Alias").map(str::to_string);
        let mut lifted = LiftedAnnotations::default();
        let mut external = Vec::new();

        for (name, element) in body {
            if name == "$Annotations" {
                external = self.parse_annotation_blocks(element, context)?;
                continue;
            }
            if name.starts_with('$') {
                continue;
            }
            if name.starts_with('@') {
                context.warn(format!(
                    "Schema-level annotation {} on {} is not applied",
                    name, namespace
                ));
                continue;
            }
            let target = format!("{}.{}", namespace, name);
            match element {
                Value::Array(overloads) => {
                    for overload in overloads {
                        let overload = overload
                            .as_object()
                            .with_context(|| format!("Overload of {} must be an object", target))?;
                        let operation = self.parse_operation(name, overload, context);
                        lifted.lift_from(&target, overload, context);
                        match str_field(overload, "$Kind") {
                            Some("Action") => schema.actions.push(operation),
                            Some("Function") => schema.functions.push(operation),
                            other => context.warn(format!(
                                "Unknown overload kind {:?} for {}",
                                other, target
                            )),
                        }
                    }
                }
                Value::Object(object) => match str_field(object, "$Kind") {
                    Some("EntityType") => {
                        let entity =
                            self.parse_entity_type(name, &target, object, &mut lifted, context)?;
                        schema.entity_types.push(entity);
                    }
                    Some("EnumType") => {
                        let enum_type =
                            self.parse_enum_type(name, &target, object, &mut lifted, context)?;
                        schema.enum_types.push(enum_type);
                    }
                    Some("EntityContainer") => {
                        let container =
                            self.parse_container(name, &target, object, &mut lifted, context)?;
                        schema.entity_container = Some(container);
                    }
                    Some("Term") | Some("TypeDefinition") => {
                        debug!(
                            "Skipping {} {}",
                            str_field(object, "$Kind").unwrap_or_default(),
                            target
                        );
                    }
                    other => context.warn(format!(
                        "Unsupported element kind {:?} for {}",
                        other, target
                    )),
                },
                _ => context.warn(format!("Unexpected value for schema element {}", target)),
            }
        }

        schema.annotations = lifted.elements;
        schema.annotations.extend(external);
        debug!(
            "Parsed schema {}: {} entity types, {} enum types, {} annotation targets",
            namespace,
            schema.entity_types.len(),
            schema.enum_types.len(),
            schema.annotations.len()
        );
        Ok(schema)
    }

    fn parse_entity_type(
        &self,
        name: &str,
        target: &str,
        object: &Map<String, Value>,
        lifted: &mut LiftedAnnotations,
        context: &mut ParseContext,
    ) -> Result<EntityType> {
        let mut entity = EntityType::new(name);
        if let Some(key) = object.get("$Key") {
            let key = key
                .as_array()
                .with_context(|| format!("$Key of {} must be an array", target))?;
            for part in key {
                // `{"Alias": "Path/To/Key"}` entries name the path
                let path = match part {
                    Value::String(s) => Some(s.clone()),
                    Value::Object(map) => map
                        .values()
                        .next()
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    _ => None,
                };
                let path = path.with_context(|| format!("Invalid $Key entry in {}", target))?;
                entity.key.push(path);
            }
        }
        if str_field(object, "$BaseType").is_some() {
            context.warn(format!("Base types of {} are not resolved", target));
        }

        for (member, value) in object {
            if member.starts_with('$') {
                continue;
            }
            if let Some(term) = member.strip_prefix('@') {
                if let Some(annotation) = parse_annotation(term, value, context) {
                    lifted.push(target, annotation);
                }
                continue;
            }
            if let Some((property, term)) = member.split_once('@') {
                if let Some(annotation) = parse_annotation(term, value, context) {
                    lifted.push(&format!("{}/{}", target, property), annotation);
                }
                continue;
            }
            let Some(definition) = value.as_object() else {
                context.warn(format!("Property {}/{} must be an object", target, member));
                continue;
            };
            let member_target = format!("{}/{}", target, member);
            lifted.lift_from(&member_target, definition, context);

            let nullable = bool_field(definition, "$Nullable").unwrap_or(true);
            match str_field(definition, "$Kind") {
                Some("NavigationProperty") => {
                    let mut nav =
                        NavigationProperty::new(member.clone(), declared_type(definition, context));
                    nav.nullable = nullable;
                    nav.partner = str_field(definition, "$Partner").map(str::to_string);
                    if let Some(constraints) = definition
                        .get("$ReferentialConstraint")
                        .and_then(Value::as_object)
                    {
                        nav.referential_constraints = constraints
                            .iter()
                            .filter(|(dependent, _)| !dependent.contains('@'))
                            .filter_map(|(dependent, principal)| {
                                principal
                                    .as_str()
                                    .map(|p| ReferentialConstraintPair::new(dependent.clone(), p))
                            })
                            .collect();
                    }
                    entity.navigation_properties.push(nav);
                }
                None | Some("Property") => {
                    let mut property =
                        Property::new(member.clone(), declared_type(definition, context));
                    property.nullable = nullable;
                    entity.properties.push(property);
                }
                Some(other) => context.warn(format!(
                    "Unsupported member kind {} for {}",
                    other, member_target
                )),
            }
        }
        Ok(entity)
    }

    fn parse_enum_type(
        &self,
        name: &str,
        target: &str,
        object: &Map<String, Value>,
        lifted: &mut LiftedAnnotations,
        context: &mut ParseContext,
    ) -> Result<EnumType> {
        let mut enum_type = EnumType::new(name);
        enum_type.underlying_type = str_field(object, "$UnderlyingType").map(str::to_string);
        enum_type.is_flags = bool_field(object, "$IsFlags");

        for (member, value) in object {
            if member.starts_with('$') {
                continue;
            }
            if let Some(term) = member.strip_prefix('@') {
                if let Some(annotation) = parse_annotation(term, value, context) {
                    lifted.push(target, annotation);
                }
                continue;
            }
            if let Some((member_name, term)) = member.split_once('@') {
                if let Some(annotation) = parse_annotation(term, value, context) {
                    lifted.push(&format!("{}/{}", target, member_name), annotation);
                }
                continue;
            }
            let raw = match value {
                Value::Number(n) => n.to_string(),
                Value::String(s) => s.clone(),
                _ => anyhow::bail!("Value of enum member {}/{} must be a number", target, member),
            };
            enum_type.members.push(EnumTypeMember {
                name: member.clone(),
                value: Some(raw),
                facets: Facets::default(),
            });
        }
        Ok(enum_type)
    }

    fn parse_container(
        &self,
        name: &str,
        target: &str,
        object: &Map<String, Value>,
        lifted: &mut LiftedAnnotations,
        context: &mut ParseContext,
    ) -> Result<EntityContainer> {
        let mut container = EntityContainer::new(name);
        for (member, value) in object {
            if member.starts_with('$') {
                continue;
            }
            if let Some(term) = member.strip_prefix('@') {
                if let Some(annotation) = parse_annotation(term, value, context) {
                    lifted.push(target, annotation);
                }
                continue;
            }
            let definition = value
                .as_object()
                .with_context(|| {
                    format!("Container member {}/{} must be an object", target, member)
                })?;
            lifted.lift_from(&format!("{}/{}", target, member), definition, context);

            let entity_set = str_field(definition, "$EntitySet").map(str::to_string);
            if let Some(action) = str_field(definition, "$Action") {
                container.action_imports.push(OperationImport {
                    name: member.clone(),
                    operation: context.resolve_term(action),
                    entity_set,
                    facets: Facets::default(),
                });
            } else if let Some(function) = str_field(definition, "$Function") {
                container.function_imports.push(OperationImport {
                    name: member.clone(),
                    operation: context.resolve_term(function),
                    entity_set,
                    facets: Facets::default(),
                });
            } else if bool_field(definition, "$Collection").unwrap_or(false) {
                let entity_type = str_field(definition, "$Type")
                    .with_context(|| format!("Entity set {} lacks $Type", member))?;
                container
                    .entity_sets
                    .push(EntitySet::new(member.clone(), context.resolve_term(entity_type)));
            } else {
                let type_name = str_field(definition, "$Type")
                    .with_context(|| format!("Singleton {} lacks $Type", member))?;
                container.singletons.push(Singleton {
                    name: member.clone(),
                    type_name: context.resolve_term(type_name),
                    facets: Facets::default(),
                });
            }
        }
        Ok(container)
    }

    fn parse_operation(
        &self,
        name: &str,
        overload: &Map<String, Value>,
        context: &ParseContext,
    ) -> Operation {
        let mut operation = Operation::new(name);
        operation.is_bound = bool_field(overload, "$IsBound").unwrap_or(false);
        operation.parameters = overload
            .get("$Parameter")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
            .filter_map(|parameter| {
                Some(Parameter {
                    name: str_field(parameter, "$Name")?.to_string(),
                    type_name: declared_type(parameter, context),
                })
            })
            .collect();
        operation.return_type = overload
            .get("$ReturnType")
            .and_then(Value::as_object)
            .map(|ret| declared_type(ret, context));
        operation
    }

    fn parse_annotation_blocks(
        &self,
        element: &Value,
        context: &ParseContext,
    ) -> Result<Vec<Annotations>> {
        let blocks = element
            .as_object()
            .context("$Annotations must be a JSON object")?;
        let mut elements = Vec::with_capacity(blocks.len());
        for (target, annotations) in blocks {
            let annotations = annotations
                .as_object()
                .with_context(|| format!("Annotations for {} must be an object", target))?;
            let head = target.split('/').next().unwrap_or(target);
            let mut element = Annotations::new(context.resolve_term(head));
            if let Some((_, rest)) = target.split_once('/') {
                element.target = format!("{}/{}", element.target, rest);
            }
            for (key, value) in annotations {
                if let Some(annotation) = key
                    .strip_prefix('@')
                    .and_then(|term| parse_annotation(term, value, context))
                {
                    element.annotations.push(annotation);
                }
            }
            elements.push(element);
        }
        Ok(elements)
    }
}
