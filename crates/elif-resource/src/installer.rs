//! Property installer - turns a Reflection into computed output fields
//!
//! Each association gets a full field keyed by its name and, when the
//! identifier is exposed, an identifier field keyed `{name}_id` or
//! `{singular}_ids`. The full field is active only when the association is
//! in the request's include set; the identifier field only when it is not.
//! Both also require the declared conditions to hold.

use std::sync::Arc;

use crate::binding::Binding;
use crate::error::ResourceResult;
use crate::field::{FieldContext, FieldDescriptor, FieldSet, FieldSource};
use crate::reflection::Reflection;

/// Install the fields for `reflection`, replacing any fields a previous
/// declaration of the same association installed
pub fn install(fields: &mut FieldSet, reflection: Arc<Reflection>) {
    let mut installed = vec![full_field(reflection.clone())];
    if reflection.exposes_identifier() {
        installed.push(identifier_field(reflection.clone()));
    }
    fields.replace_association(reflection.name(), installed);
}

/// Field carrying the full representation of the related object(s)
pub fn full_field(reflection: Arc<Reflection>) -> FieldDescriptor {
    let getter_reflection = reflection.clone();
    let activation_reflection = reflection.clone();

    FieldDescriptor::new(
        reflection.full_key(),
        FieldSource::AssociationFull(reflection.name().to_string()),
        move |ctx| Binding::new(&getter_reflection, ctx).represent(),
    )
    .with_activation(move |ctx| {
        if !ctx.scope.options().includes(activation_reflection.name()) {
            return Ok(false);
        }
        conditions_hold(&activation_reflection, ctx)
    })
}

/// Field carrying only the identifier(s) of the related object(s)
pub fn identifier_field(reflection: Arc<Reflection>) -> FieldDescriptor {
    let getter_reflection = reflection.clone();
    let activation_reflection = reflection.clone();

    FieldDescriptor::new(
        reflection.identifier_key(),
        FieldSource::AssociationIdentifier(reflection.name().to_string()),
        move |ctx| {
            Binding::new(&getter_reflection, ctx)
                .represent_identifiers()
                .map(Some)
        },
    )
    .with_activation(move |ctx| {
        if ctx.scope.options().includes(activation_reflection.name()) {
            return Ok(false);
        }
        conditions_hold(&activation_reflection, ctx)
    })
}

fn conditions_hold(reflection: &Reflection, ctx: &FieldContext<'_>) -> ResourceResult<bool> {
    let condition_ctx = ctx.condition_context(reflection.name());
    reflection.evaluate_conditions(&condition_ctx, ctx.scope.options())
}
