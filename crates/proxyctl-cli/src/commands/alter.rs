//! Handlers for the `alter` command family: runtime parameter updates,
//! filter chain replacement, and admin user password changes.

use std::io::{self, IsTerminal};

use anyhow::anyhow;
use serde_json::Value;

use proxyctl_api_models::{
    FilterChain, FilterRelationshipPatch, InetUserDocument, InetUserResource, ParameterPatch,
    Target,
};

use crate::cli::{AlterObjectArgs, AlterUserArgs, ServiceFiltersArgs, TargetKind};
use crate::client::{ApiError, AppContext, CliError, CliResult};

/// Update one runtime parameter of a named object.
pub(crate) async fn handle_alter_object(
    ctx: &AppContext,
    kind: TargetKind,
    args: AlterObjectArgs,
) -> CliResult<()> {
    let target = match kind {
        TargetKind::Server => Target::Server(require_name(&args.name, "server")?),
        TargetKind::Monitor => Target::Monitor(require_name(&args.name, "monitor")?),
        TargetKind::Service => Target::Service(require_name(&args.name, "service")?),
    };
    handle_alter_parameter(ctx, &target, &args.key, &args.value).await
}

/// Core parameter update: PATCH the target with a single-key document.
///
/// The value goes out exactly as typed on the command line; the server
/// coerces or rejects it. A rejection comes back as a remote validation
/// message, never a local allow-list check.
pub(crate) async fn handle_alter_parameter(
    ctx: &AppContext,
    target: &Target,
    key: &str,
    value: &str,
) -> CliResult<()> {
    if key.trim().is_empty() {
        return Err(CliError::validation("parameter name must not be empty"));
    }

    let patch = ParameterPatch::new(target, key, Value::String(value.to_string()));
    ctx.patch_json(&target.resource_path(), &patch).await?;
    println!("OK");
    Ok(())
}

/// Replace the filter chain of a service. The argument order is the
/// execution order; an empty list removes every filter.
pub(crate) async fn handle_alter_service_filters(
    ctx: &AppContext,
    args: ServiceFiltersArgs,
) -> CliResult<()> {
    let service = require_name(&args.service, "service")?;
    let chain = FilterChain::from_names(args.filters);
    let patch = FilterRelationshipPatch::new(&service, chain);
    ctx.patch_json(&Target::Service(service).resource_path(), &patch)
        .await?;
    println!("OK");
    Ok(())
}

/// Change an admin user's password.
///
/// The admin API has no partial-update verb for users, so this is a
/// strictly sequential fetch, delete, recreate sequence: the fetch
/// captures the account role so it survives the recreate, and nothing
/// is mutated if the user does not exist. The sequence is not atomic:
/// if the recreating POST fails after the DELETE succeeded, the user is
/// gone and the failure says so explicitly.
pub(crate) async fn handle_alter_user(ctx: &AppContext, args: AlterUserArgs) -> CliResult<()> {
    let name = require_name(&args.name, "user")?;
    let password = resolve_password(args.password)?;

    let path = Target::InetUser(name.clone()).resource_path();
    let fetched = ctx.get_json(&path).await?;
    let user: InetUserResource = serde_json::from_value(fetched)
        .map_err(|err| CliError::failure(anyhow!("failed to decode user '{name}': {err}")))?;
    let account = user.data.attributes.account;

    ctx.delete(&path).await?;

    let document = InetUserDocument::new(&name, &password, &account);
    if let Err(source) = ctx.post_json("users/inet", &document).await {
        return Err(ApiError::UserNotRecreated {
            name,
            source: Box::new(source),
        }
        .into());
    }

    println!("OK (account type '{account}' preserved)");
    Ok(())
}

fn require_name(raw: &str, label: &str) -> CliResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CliError::validation(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn resolve_password(provided: Option<String>) -> CliResult<String> {
    if let Some(value) = provided {
        if value.is_empty() {
            return Err(CliError::validation("password must not be empty"));
        }
        return Ok(value);
    }

    if io::stdin().is_terminal() {
        let pass = rpassword::prompt_password("New password: ").map_err(|err| {
            CliError::failure(anyhow!("failed to read password from stdin: {err}"))
        })?;
        if pass.is_empty() {
            return Err(CliError::validation("password must not be empty"));
        }
        Ok(pass)
    } else {
        Err(CliError::validation(
            "password required; supply it as an argument when running non-interactively",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use reqwest::Client;
    use serde_json::json;

    fn context_for(server: &MockServer) -> Result<AppContext> {
        Ok(AppContext {
            client: Client::new(),
            base_url: server.base_url().parse().map_err(|_| anyhow!("valid URL"))?,
            user: "admin".to_string(),
            password: "mariadb".to_string(),
        })
    }

    #[tokio::test]
    async fn alter_server_patches_single_parameter() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(PATCH).path("/v1/servers/server2").json_body(json!({
                "data": {
                    "id": "server2",
                    "type": "servers",
                    "attributes": {
                        "parameters": { "max_connections": "100" }
                    }
                }
            }));
            then.status(200);
        });

        let ctx = context_for(&server)?;
        handle_alter_object(
            &ctx,
            TargetKind::Server,
            AlterObjectArgs {
                name: "server2".to_string(),
                key: "max_connections".to_string(),
                value: "100".to_string(),
            },
        )
        .await
        .map_err(|err| anyhow!(err.display_message()))?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn alter_maxscale_patches_singleton_without_id() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(PATCH).path("/v1/maxscale").json_body(json!({
                "data": {
                    "type": "maxscale",
                    "attributes": {
                        "parameters": { "passive": "true" }
                    }
                }
            }));
            then.status(200);
        });

        let ctx = context_for(&server)?;
        handle_alter_parameter(&ctx, &Target::Maxscale, "passive", "true")
            .await
            .map_err(|err| anyhow!(err.display_message()))?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn alter_logging_targets_log_path() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(PATCH).path("/v1/maxscale/logs");
            then.status(200);
        });

        let ctx = context_for(&server)?;
        handle_alter_parameter(&ctx, &Target::Logs, "ms_timestamp", "1")
            .await
            .map_err(|err| anyhow!(err.display_message()))?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn service_filters_preserve_order() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(PATCH).path("/v1/services/my-service").json_body(json!({
                "data": {
                    "id": "my-service",
                    "type": "services",
                    "relationships": {
                        "filters": {
                            "data": [
                                { "id": "A", "type": "filters" },
                                { "id": "B", "type": "filters" },
                                { "id": "C", "type": "filters" }
                            ]
                        }
                    }
                }
            }));
            then.status(200);
        });

        let ctx = context_for(&server)?;
        handle_alter_service_filters(
            &ctx,
            ServiceFiltersArgs {
                service: "my-service".to_string(),
                filters: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            },
        )
        .await
        .map_err(|err| anyhow!(err.display_message()))?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn no_filters_sends_null_relationship() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(PATCH).path("/v1/services/my-service").json_body(json!({
                "data": {
                    "id": "my-service",
                    "type": "services",
                    "relationships": {
                        "filters": { "data": null }
                    }
                }
            }));
            then.status(200);
        });

        let ctx = context_for(&server)?;
        handle_alter_service_filters(
            &ctx,
            ServiceFiltersArgs {
                service: "my-service".to_string(),
                filters: Vec::new(),
            },
        )
        .await
        .map_err(|err| anyhow!(err.display_message()))?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn user_update_fetches_deletes_then_recreates() -> Result<()> {
        let server = MockServer::start_async().await;
        let get_mock = server.mock(|when, then| {
            when.method(GET).path("/v1/users/inet/bob");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "data": {
                        "id": "bob",
                        "type": "inet",
                        "attributes": { "account": "admin" }
                    }
                }));
        });
        let delete_mock = server.mock(|when, then| {
            when.method(DELETE).path("/v1/users/inet/bob");
            then.status(204);
        });
        let post_mock = server.mock(|when, then| {
            when.method(POST).path("/v1/users/inet").json_body(json!({
                "data": {
                    "id": "bob",
                    "type": "inet",
                    "attributes": {
                        "password": "newpass",
                        "account": "admin"
                    }
                }
            }));
            then.status(204);
        });

        let ctx = context_for(&server)?;
        handle_alter_user(
            &ctx,
            AlterUserArgs {
                name: "bob".to_string(),
                password: Some("newpass".to_string()),
            },
        )
        .await
        .map_err(|err| anyhow!(err.display_message()))?;

        get_mock.assert();
        delete_mock.assert();
        post_mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn missing_user_aborts_before_any_mutation() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/v1/users/inet/ghost");
            then.status(404);
        });
        let delete_mock = server.mock(|when, then| {
            when.method(DELETE).path("/v1/users/inet/ghost");
            then.status(204);
        });

        let ctx = context_for(&server)?;
        let err = handle_alter_user(
            &ctx,
            AlterUserArgs {
                name: "ghost".to_string(),
                password: Some("newpass".to_string()),
            },
        )
        .await
        .expect_err("missing user should fail");

        assert!(err.display_message().contains("does not exist"));
        delete_mock.assert_calls(0);
        Ok(())
    }

    #[tokio::test]
    async fn failed_recreate_reports_partial_completion() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/v1/users/inet/bob");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "data": {
                        "id": "bob",
                        "type": "inet",
                        "attributes": { "account": "basic" }
                    }
                }));
        });
        let delete_mock = server.mock(|when, then| {
            when.method(DELETE).path("/v1/users/inet/bob");
            then.status(204);
        });
        server.mock(|when, then| {
            when.method(POST).path("/v1/users/inet");
            then.status(500);
        });

        let ctx = context_for(&server)?;
        let err = handle_alter_user(
            &ctx,
            AlterUserArgs {
                name: "bob".to_string(),
                password: Some("newpass".to_string()),
            },
        )
        .await
        .expect_err("failed recreate should fail");

        delete_mock.assert();
        let message = err.display_message();
        assert!(message.contains("deleted but not recreated"));
        assert!(message.contains("bob"));
        Ok(())
    }

    #[tokio::test]
    async fn remote_rejection_surfaces_server_detail() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(PATCH).path("/v1/servers/server2");
            then.status(403)
                .header("content-type", "application/json")
                .json_body(json!({
                    "errors": [{ "detail": "Invalid parameter: something" }]
                }));
        });

        let ctx = context_for(&server)?;
        let err = handle_alter_object(
            &ctx,
            TargetKind::Server,
            AlterObjectArgs {
                name: "server2".to_string(),
                key: "something".to_string(),
                value: "1".to_string(),
            },
        )
        .await
        .expect_err("remote rejection should fail");

        assert!(matches!(&err, CliError::Validation(message)
            if message == "Invalid parameter: something"));
        Ok(())
    }

    #[test]
    fn empty_object_name_is_rejected_locally() {
        let err = require_name("  ", "server").expect_err("empty name should fail");
        assert!(matches!(err, CliError::Validation(message)
            if message.contains("server name")));
    }

    #[test]
    fn empty_password_argument_is_rejected() {
        let err =
            resolve_password(Some(String::new())).expect_err("empty password should fail");
        assert!(matches!(err, CliError::Validation(_)));
    }

    #[test]
    fn provided_password_is_used_verbatim() -> Result<()> {
        let resolved =
            resolve_password(Some("s3cret".to_string())).map_err(|err| anyhow!("{err:?}"))?;
        assert_eq!(resolved, "s3cret");
        Ok(())
    }
}
