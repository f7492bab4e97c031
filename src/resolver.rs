//! Configuration resolution across the three stores
//!
//! Pure merge/filter/derive passes over schema, policy and user data. The
//! three sources can diverge — drivers change between versions, saved user
//! options go stale, freshly added applications start empty — and these
//! functions reconcile them into one consistent view. Every pass is
//! idempotent, so callers may re-run them after any mutation.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{DricfgError, Result};
use crate::policy::PolicyStore;
use crate::schema::{OptionDescriptor, SchemaStore};
use crate::user_config::{Application, UserConfigStore, UserDriverConfig};

/// Which option values of a non-default application are persisted on save.
///
/// The default application entry is always emitted regardless; it anchors
/// the driver's baseline in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString)]
pub enum SaveInclusion {
    /// Persist every schema-valid, well-formed option value.
    #[default]
    #[strum(serialize = "everything")]
    Everything,
    /// Omit values equal to the effective default (policy override or
    /// schema-implicit default), keeping only deliberate deviations.
    #[strum(serialize = "non-default")]
    NonDefault,
}

/// The value an option falls back to when the user has not set one:
/// the policy override if present, else the kind's implicit default.
pub fn effective_default(
    policy: &PolicyStore,
    driver: &str,
    descriptor: &OptionDescriptor,
) -> String {
    match policy.lookup(driver, &descriptor.name) {
        Some(value) => value.to_string(),
        None => descriptor.kind.implicit_default(),
    }
}

/// Makes every application's option list schema-complete and display-ready.
///
/// Every driver in the schema store gains a user entry (with the default
/// application) if it has none, and every application gains one option per
/// schema descriptor: present values are kept, absent ones are created with
/// the effective default. Applications end up in presentation order, the
/// default application first and the rest sorted by name.
///
/// Fails with a consistency error if the user store references a driver the
/// schema store does not know — that is reported, never silently skipped.
pub fn merge_options_for_display(
    policy: &PolicyStore,
    schema: &SchemaStore,
    user: &mut UserConfigStore,
) -> Result<()> {
    for user_driver in &user.drivers {
        if schema.find_driver(&user_driver.driver).is_none() {
            return Err(DricfgError::consistency(format!(
                "user configuration references driver '{}' with no loaded schema",
                user_driver.driver
            )));
        }
    }

    for driver_config in schema.drivers() {
        let entry = user.driver_entry(&driver_config.driver);
        entry.ensure_default_application();
        entry.sort_applications();

        for app in &mut entry.applications {
            let mut added = 0usize;
            for descriptor in driver_config.options() {
                if app.option(&descriptor.name).is_none() {
                    let value = effective_default(policy, &driver_config.driver, descriptor);
                    app.set_option(&descriptor.name, &value);
                    added += 1;
                }
            }
            if added > 0 {
                debug!(
                    "backfilled {} option(s) for application '{}' on driver '{}'",
                    added, app.name, driver_config.driver
                );
            }
        }
    }

    Ok(())
}

/// Drops application options whose name no longer exists in the driver's
/// current schema.
///
/// Models schema drift across driver upgrades: stale saved options are
/// normalized away, not reported as errors. Idempotent by construction.
pub fn filter_driver_unsupported_options(
    schema: &SchemaStore,
    user: &mut UserConfigStore,
) -> Result<()> {
    for user_driver in &mut user.drivers {
        let driver_config = schema.find_driver(&user_driver.driver).ok_or_else(|| {
            DricfgError::consistency(format!(
                "cannot filter options for driver '{}': no loaded schema",
                user_driver.driver
            ))
        })?;

        for app in &mut user_driver.applications {
            app.options.retain(|option| {
                let supported = driver_config.find_option(&option.name).is_some();
                if !supported {
                    debug!(
                        "dropping stale option '{}' from application '{}' (driver '{}')",
                        option.name, app.name, user_driver.driver
                    );
                }
                supported
            });
        }
    }

    Ok(())
}

/// Derives the minimal store intended for persistence.
///
/// Schema validity is re-checked here rather than assumed from earlier
/// filtering: an option is emitted only if its descriptor still exists and
/// its value is well-formed for the descriptor's kind. Output ordering is
/// deterministic — drivers in schema load order, applications in list
/// order, options in schema section/option order — so repeated saves of
/// unchanged state are byte-identical.
pub fn resolve_options_for_save(
    policy: &PolicyStore,
    schema: &SchemaStore,
    user: &UserConfigStore,
    inclusion: SaveInclusion,
) -> Result<UserConfigStore> {
    for user_driver in &user.drivers {
        if schema.find_driver(&user_driver.driver).is_none() {
            return Err(DricfgError::consistency(format!(
                "cannot save options for driver '{}': no loaded schema",
                user_driver.driver
            )));
        }
    }

    let mut resolved = UserConfigStore::new();

    for driver_config in schema.drivers() {
        let Some(user_driver) = user.driver(&driver_config.driver) else {
            continue;
        };

        let mut out_driver = UserDriverConfig {
            driver: user_driver.driver.clone(),
            applications: Vec::with_capacity(user_driver.applications.len()),
        };

        for app in &user_driver.applications {
            let mut out_app = Application::new(&app.name, &app.executable);

            for descriptor in driver_config.options() {
                let Some(option) = app.option(&descriptor.name) else {
                    continue;
                };
                if !descriptor.kind.validates(&option.value) {
                    warn!(
                        "skipping malformed value '{}' for option '{}' of '{}' on save",
                        option.value, option.name, app.name
                    );
                    continue;
                }
                if inclusion == SaveInclusion::NonDefault
                    && option.value == effective_default(policy, &user_driver.driver, descriptor)
                {
                    continue;
                }
                out_app.set_option(&option.name, &option.value);
            }

            // The application entry itself is kept even when every value was
            // omitted; the default application anchors the driver baseline
            // and explicitly added applications stay addressable.
            out_driver.applications.push(out_app);
        }

        out_driver.ensure_default_application();
        resolved.drivers.push(out_driver);
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_driver_schema;
    use crate::user_config::Application;

    fn test_schema() -> SchemaStore {
        let text = r#"{
            "driver": "i965",
            "sections": [
                {
                    "description": "Performance",
                    "options": [
                        {
                            "name": "vblank_mode",
                            "type": "enum",
                            "values": [
                                {"label": "Off", "raw": "0"},
                                {"label": "On", "raw": "1"}
                            ]
                        },
                        {"name": "mesa_glthread", "type": "bool"},
                        {"name": "lod_bias", "type": "int", "min": -2, "max": 2}
                    ]
                }
            ]
        }"#;
        let mut store = SchemaStore::new();
        store.load_driver(text).unwrap();
        store
    }

    fn assert_schema_complete(schema: &SchemaStore, user: &UserConfigStore) {
        for user_driver in &user.drivers {
            let driver_config = schema.find_driver(&user_driver.driver).unwrap();
            for app in &user_driver.applications {
                assert_eq!(app.options.len(), driver_config.option_count());
                for descriptor in driver_config.options() {
                    assert!(
                        app.option(&descriptor.name).is_some(),
                        "option '{}' missing on '{}'",
                        descriptor.name,
                        app.name
                    );
                }
            }
        }
    }

    #[test]
    fn test_merge_backfills_missing_options() {
        let schema = test_schema();
        let policy = PolicyStore::new();
        let mut user = UserConfigStore::new();

        merge_options_for_display(&policy, &schema, &mut user).unwrap();

        let driver = user.driver("i965").unwrap();
        let default_app = driver.default_application().unwrap();
        // No policy override: first enum value seeds vblank_mode
        assert_eq!(default_app.option("vblank_mode").unwrap().value, "0");
        assert_eq!(default_app.option("mesa_glthread").unwrap().value, "false");
        assert_eq!(default_app.option("lod_bias").unwrap().value, "-2");
        assert_schema_complete(&schema, &user);
    }

    #[test]
    fn test_merge_applies_policy_override_as_default() {
        let schema = test_schema();
        let mut policy = PolicyStore::new();
        policy.set_override("i965", "vblank_mode", "1");
        let mut user = UserConfigStore::new();

        merge_options_for_display(&policy, &schema, &mut user).unwrap();

        let app = user.driver("i965").unwrap().default_application().unwrap();
        assert_eq!(app.option("vblank_mode").unwrap().value, "1");
    }

    #[test]
    fn test_merge_keeps_existing_user_values() {
        let schema = test_schema();
        let policy = PolicyStore::new();
        let mut user = UserConfigStore::new();
        user.driver_entry("i965")
            .application_mut("")
            .unwrap()
            .set_option("mesa_glthread", "true");

        merge_options_for_display(&policy, &schema, &mut user).unwrap();

        let app = user.driver("i965").unwrap().default_application().unwrap();
        assert_eq!(app.option("mesa_glthread").unwrap().value, "true");
    }

    #[test]
    fn test_merge_is_idempotent() {
        let schema = test_schema();
        let policy = PolicyStore::new();
        let mut user = UserConfigStore::new();

        merge_options_for_display(&policy, &schema, &mut user).unwrap();
        let once = user.clone();
        merge_options_for_display(&policy, &schema, &mut user).unwrap();

        assert_eq!(user, once);
    }

    #[test]
    fn test_merge_rejects_unknown_user_driver() {
        let schema = test_schema();
        let policy = PolicyStore::new();
        let mut user = UserConfigStore::new();
        user.driver_entry("nouveau");

        let err = merge_options_for_display(&policy, &schema, &mut user).unwrap_err();
        assert!(matches!(err, DricfgError::Consistency(_)));
        assert!(err.to_string().contains("nouveau"));
    }

    #[test]
    fn test_filter_drops_stale_options_only() {
        let schema = test_schema();
        let mut user = UserConfigStore::new();
        let app = user.driver_entry("i965").application_mut("").unwrap();
        app.set_option("old_removed_opt", "3");
        app.set_option("mesa_glthread", "true");

        filter_driver_unsupported_options(&schema, &mut user).unwrap();

        let app = user.driver("i965").unwrap().default_application().unwrap();
        assert!(app.option("old_removed_opt").is_none());
        assert_eq!(app.option("mesa_glthread").unwrap().value, "true");
    }

    #[test]
    fn test_filter_is_idempotent() {
        let schema = test_schema();
        let mut user = UserConfigStore::new();
        let app = user.driver_entry("i965").application_mut("").unwrap();
        app.set_option("old_removed_opt", "3");
        app.set_option("vblank_mode", "1");

        filter_driver_unsupported_options(&schema, &mut user).unwrap();
        let once = user.clone();
        filter_driver_unsupported_options(&schema, &mut user).unwrap();

        assert_eq!(user, once);
    }

    #[test]
    fn test_filter_errors_on_unknown_driver() {
        let schema = test_schema();
        let mut user = UserConfigStore::new();
        user.driver_entry("nouveau");

        assert!(filter_driver_unsupported_options(&schema, &mut user).is_err());
    }

    #[test]
    fn test_resolve_everything_keeps_all_valid_values() {
        let schema = test_schema();
        let policy = PolicyStore::new();
        let mut user = UserConfigStore::new();
        merge_options_for_display(&policy, &schema, &mut user).unwrap();

        let resolved =
            resolve_options_for_save(&policy, &schema, &user, SaveInclusion::Everything).unwrap();

        let app = resolved
            .driver("i965")
            .unwrap()
            .default_application()
            .unwrap();
        assert_eq!(app.options.len(), 3);
    }

    #[test]
    fn test_resolve_non_default_omits_baseline_values() {
        let schema = test_schema();
        let policy = PolicyStore::new();
        let mut user = UserConfigStore::new();
        merge_options_for_display(&policy, &schema, &mut user).unwrap();
        user.driver_mut("i965")
            .unwrap()
            .application_mut("")
            .unwrap()
            .set_option("vblank_mode", "1");

        let resolved =
            resolve_options_for_save(&policy, &schema, &user, SaveInclusion::NonDefault).unwrap();

        let app = resolved
            .driver("i965")
            .unwrap()
            .default_application()
            .unwrap();
        // Only the deviation from the baseline survives
        assert_eq!(app.options.len(), 1);
        assert_eq!(app.option("vblank_mode").unwrap().value, "1");
    }

    #[test]
    fn test_resolve_default_app_persisted_even_when_empty() {
        let schema = test_schema();
        let policy = PolicyStore::new();
        let mut user = UserConfigStore::new();
        merge_options_for_display(&policy, &schema, &mut user).unwrap();

        let resolved =
            resolve_options_for_save(&policy, &schema, &user, SaveInclusion::NonDefault).unwrap();

        let driver = resolved.driver("i965").unwrap();
        let app = driver.default_application().unwrap();
        assert!(app.options.is_empty());
        assert_eq!(driver.applications.len(), 1);
    }

    #[test]
    fn test_resolve_skips_malformed_and_stale_values() {
        let schema = test_schema();
        let policy = PolicyStore::new();
        let mut user = UserConfigStore::new();
        let app = user.driver_entry("i965").application_mut("").unwrap();
        app.set_option("lod_bias", "99"); // out of range
        app.set_option("mesa_glthread", "yes"); // malformed bool
        app.set_option("ancient_opt", "1"); // no descriptor
        app.set_option("vblank_mode", "1"); // valid

        let resolved =
            resolve_options_for_save(&policy, &schema, &user, SaveInclusion::Everything).unwrap();

        let app = resolved
            .driver("i965")
            .unwrap()
            .default_application()
            .unwrap();
        assert_eq!(app.options.len(), 1);
        assert_eq!(app.option("vblank_mode").unwrap().value, "1");
    }

    #[test]
    fn test_resolve_emits_options_in_schema_order() {
        let schema = test_schema();
        let policy = PolicyStore::new();
        let mut user = UserConfigStore::new();
        // Insert in reverse of canonical order
        let app = user.driver_entry("i965").application_mut("").unwrap();
        app.set_option("vblank_mode", "1");
        app.set_option("mesa_glthread", "true");
        app.set_option("lod_bias", "0");

        let resolved =
            resolve_options_for_save(&policy, &schema, &user, SaveInclusion::Everything).unwrap();

        let names: Vec<&str> = resolved
            .driver("i965")
            .unwrap()
            .default_application()
            .unwrap()
            .options
            .iter()
            .map(|o| o.name.as_str())
            .collect();
        // Canonical order after the schema's stable sort by name
        assert_eq!(names, vec!["lod_bias", "mesa_glthread", "vblank_mode"]);
    }

    #[test]
    fn test_resolve_errors_on_unknown_driver() {
        let schema = test_schema();
        let policy = PolicyStore::new();
        let mut user = UserConfigStore::new();
        user.driver_entry("nouveau");

        let err = resolve_options_for_save(&policy, &schema, &user, SaveInclusion::Everything)
            .unwrap_err();
        assert!(matches!(err, DricfgError::Consistency(_)));
    }

    #[test]
    fn test_resolve_does_not_mutate_input() {
        let schema = test_schema();
        let policy = PolicyStore::new();
        let mut user = UserConfigStore::new();
        merge_options_for_display(&policy, &schema, &mut user).unwrap();
        let snapshot = user.clone();

        resolve_options_for_save(&policy, &schema, &user, SaveInclusion::NonDefault).unwrap();
        assert_eq!(user, snapshot);
    }

    #[test]
    fn test_merge_vblank_scenario_from_empty_user_config() {
        // Schema declares vblank_mode as Enum [Off=0, On=1]; the user config
        // has no entry for it. After the merge the application gains the
        // option seeded from the policy override (or first enum value).
        let schema = test_schema();
        let mut user = UserConfigStore::new();
        user.driver_entry("i965")
            .applications
            .push(Application::new("glxgears", "glxgears"));

        let mut policy = PolicyStore::new();
        policy.set_override("i965", "vblank_mode", "1");
        merge_options_for_display(&policy, &schema, &mut user).unwrap();

        let app = user
            .driver("i965")
            .unwrap()
            .application("glxgears")
            .unwrap();
        assert_eq!(app.option("vblank_mode").unwrap().value, "1");
    }
}
