// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

//! MCP (Model Context Protocol) stdio transport — one tool per operation,
//! built on rmcp's `ServerHandler` (`get_info`/`list_tools`/`call_tool`)
//! and its `serve_stdio` entry point. This workspace pins `rmcp = "0.3"`,
//! so the concrete type names below (`CallToolRequestParam`,
//! `PaginatedRequestParam`) follow that version's older, non-pluralized
//! naming.
//!
//! [`BusMcpServer`] also binds a per-connection agent identity: it
//! remembers the last agent that registered, resumed, or heartbeat on
//! this connection so a later `msg.wait` call can omit credentials and
//! still be attributed correctly, carried through call state rather than
//! a global `connection_id`-keyed map.

use std::borrow::Cow;
use std::sync::{Arc, Mutex};

use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, ErrorData as McpError, JsonObject,
    ListToolsResult, PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool as McpTool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{ServerHandler, ServiceExt};
use serde_json::{json, Value};

use crate::error::Error;
use crate::facade::Facade;

/// One entry per MCP tool this server exposes.
struct ToolSpec {
    name: &'static str,
    description: &'static str,
    schema: fn() -> Value,
}

fn obj_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "thread.create",
        description: "Create a new conversation thread",
        schema: || obj_schema(json!({"topic": {"type": "string"}, "metadata": {}, "system_prompt": {"type": "string"}}), &["topic"]),
    },
    ToolSpec {
        name: "thread.get",
        description: "Fetch a thread by id",
        schema: || obj_schema(json!({"id": {"type": "string"}}), &["id"]),
    },
    ToolSpec {
        name: "thread.list",
        description: "List threads, optionally filtered by status",
        schema: || obj_schema(json!({"status": {"type": "string"}, "include_archived": {"type": "boolean"}}), &[]),
    },
    ToolSpec {
        name: "thread.set_state",
        description: "Transition a thread's lifecycle state",
        schema: || obj_schema(json!({"id": {"type": "string"}, "state": {"type": "string"}}), &["id", "state"]),
    },
    ToolSpec {
        name: "thread.close",
        description: "Close a thread with an optional summary",
        schema: || obj_schema(json!({"id": {"type": "string"}, "summary": {"type": "string"}}), &["id"]),
    },
    ToolSpec {
        name: "thread.archive",
        description: "Archive a closed thread",
        schema: || obj_schema(json!({"id": {"type": "string"}}), &["id"]),
    },
    ToolSpec {
        name: "thread.unarchive",
        description: "Unarchive a thread",
        schema: || obj_schema(json!({"id": {"type": "string"}}), &["id"]),
    },
    ToolSpec {
        name: "thread.delete",
        description: "Permanently delete a thread and its messages (requires confirm=true)",
        schema: || obj_schema(json!({"id": {"type": "string"}, "confirm": {"type": "boolean"}}), &["id", "confirm"]),
    },
    ToolSpec {
        name: "msg.post",
        description: "Post a message to a thread",
        schema: || {
            obj_schema(
                json!({
                    "thread_id": {"type": "string"},
                    "author": {"type": "string"},
                    "content": {"type": "string"},
                    "role": {"type": "string"},
                    "metadata": {},
                }),
                &["thread_id", "author", "content"],
            )
        },
    },
    ToolSpec {
        name: "msg.list",
        description: "List messages in a thread after a given sequence number",
        schema: || {
            obj_schema(
                json!({
                    "thread_id": {"type": "string"},
                    "after_seq": {"type": "integer"},
                    "limit": {"type": "integer"},
                    "include_system_prompt": {"type": "boolean"},
                }),
                &["thread_id"],
            )
        },
    },
    ToolSpec {
        name: "msg.wait",
        description: "Long-poll for new messages in a thread",
        schema: || {
            obj_schema(
                json!({
                    "thread_id": {"type": "string"},
                    "after_seq": {"type": "integer"},
                    "timeout_ms": {"type": "integer"},
                    "agent_id": {"type": "string"},
                    "token": {"type": "string"},
                }),
                &["thread_id"],
            )
        },
    },
    ToolSpec {
        name: "agent.register",
        description: "Register a new agent identity and receive its capability token",
        schema: || {
            obj_schema(
                json!({
                    "ide": {"type": "string"},
                    "model": {"type": "string"},
                    "description": {"type": "string"},
                    "capabilities": {},
                    "display_name": {"type": "string"},
                }),
                &["ide", "model"],
            )
        },
    },
    ToolSpec {
        name: "agent.heartbeat",
        description: "Record agent liveness",
        schema: || obj_schema(json!({"id": {"type": "string"}, "token": {"type": "string"}}), &["id", "token"]),
    },
    ToolSpec {
        name: "agent.resume",
        description: "Resume a previously unregistered agent",
        schema: || obj_schema(json!({"id": {"type": "string"}, "token": {"type": "string"}}), &["id", "token"]),
    },
    ToolSpec {
        name: "agent.unregister",
        description: "Mark an agent offline",
        schema: || obj_schema(json!({"id": {"type": "string"}, "token": {"type": "string"}}), &["id", "token"]),
    },
    ToolSpec {
        name: "agent.set_typing",
        description: "Signal that an agent is composing a message in a thread",
        schema: || {
            obj_schema(
                json!({"id": {"type": "string"}, "token": {"type": "string"}, "thread_id": {"type": "string"}}),
                &["id", "token", "thread_id"],
            )
        },
    },
    ToolSpec {
        name: "agent.list",
        description: "List registered agents",
        schema: || obj_schema(json!({}), &[]),
    },
    ToolSpec {
        name: "bus.config",
        description: "Report the bus's self-reported configuration summary",
        schema: || obj_schema(json!({}), &[]),
    },
];

fn to_mcp_tool(spec: &ToolSpec) -> McpTool {
    let schema: JsonObject = match (spec.schema)() {
        Value::Object(m) => m,
        _ => serde_json::Map::new(),
    };
    McpTool::new(Cow::Borrowed(spec.name), Cow::Borrowed(spec.description), Arc::new(schema))
}

fn to_mcp_error(err: Error) -> McpError {
    McpError::internal_error(err.to_string(), None)
}

fn str_arg<'a>(args: &'a Value, key: &str) -> Result<&'a str, McpError> {
    args.get(key).and_then(Value::as_str).ok_or_else(|| McpError::invalid_params(format!("missing argument: {key}"), None))
}

fn result_json(value: Value) -> CallToolResult {
    CallToolResult::success(vec![Content::text(value.to_string())])
}

/// The agent identity bound to this MCP connection. An rmcp stdio server
/// serves exactly one peer for its lifetime, so per-connection state
/// collapses to one slot here rather than a `connection_id`-keyed map.
#[derive(Clone)]
struct BoundIdentity {
    agent_id: String,
    token: String,
}

/// The rmcp `ServerHandler` for the bus: dispatches every call straight
/// into the shared [`Facade`], remembering the last agent identity that
/// registered, resumed, or heartbeat on this connection so a later
/// `msg.wait` call can omit `agent_id`/`token` and still be attributed
/// correctly.
#[derive(Clone)]
pub struct BusMcpServer {
    facade: Arc<Facade>,
    session: Arc<Mutex<Option<BoundIdentity>>>,
}

impl BusMcpServer {
    pub fn new(facade: Arc<Facade>) -> Self {
        Self { facade, session: Arc::new(Mutex::new(None)) }
    }

    fn bind_session(&self, agent_id: &str, token: &str) {
        let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        *session = Some(BoundIdentity { agent_id: agent_id.to_string(), token: token.to_string() });
    }

    fn bound_session(&self) -> Option<(String, String)> {
        let session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        session.as_ref().map(|b| (b.agent_id.clone(), b.token.clone()))
    }

    async fn dispatch(&self, name: &str, args: Value) -> Result<Value, McpError> {
        let facade = &self.facade;
        match name {
            "thread.create" => {
                let topic = str_arg(&args, "topic")?;
                let metadata = args.get("metadata").cloned();
                let system_prompt = args.get("system_prompt").and_then(Value::as_str).map(str::to_string);
                let thread = facade.thread_create(topic, metadata, system_prompt).map_err(to_mcp_error)?;
                Ok(serde_json::to_value(thread).unwrap_or(Value::Null))
            }
            "thread.get" => {
                let id = str_arg(&args, "id")?;
                let thread = facade.thread_get(id).map_err(to_mcp_error)?;
                Ok(serde_json::to_value(thread).unwrap_or(Value::Null))
            }
            "thread.list" => {
                let status = args.get("status").and_then(Value::as_str);
                let include_archived = args.get("include_archived").and_then(Value::as_bool).unwrap_or(false);
                let threads = facade.thread_list(status, include_archived).map_err(to_mcp_error)?;
                Ok(serde_json::to_value(threads).unwrap_or(Value::Null))
            }
            "thread.set_state" => {
                let id = str_arg(&args, "id")?;
                let state = str_arg(&args, "state")?;
                let ok = facade.thread_set_state(id, state).map_err(to_mcp_error)?;
                Ok(json!({"ok": ok}))
            }
            "thread.close" => {
                let id = str_arg(&args, "id")?;
                let summary = args.get("summary").and_then(Value::as_str).map(str::to_string);
                let ok = facade.thread_close(id, summary).map_err(to_mcp_error)?;
                Ok(json!({"ok": ok}))
            }
            "thread.archive" => {
                let id = str_arg(&args, "id")?;
                let ok = facade.thread_archive(id).map_err(to_mcp_error)?;
                Ok(json!({"ok": ok}))
            }
            "thread.unarchive" => {
                let id = str_arg(&args, "id")?;
                let ok = facade.thread_unarchive(id).map_err(to_mcp_error)?;
                Ok(json!({"ok": ok}))
            }
            "thread.delete" => {
                let id = str_arg(&args, "id")?;
                let confirm = args.get("confirm").and_then(Value::as_bool).unwrap_or(false);
                let receipt = facade.thread_delete(id, confirm).map_err(to_mcp_error)?;
                Ok(serde_json::to_value(receipt).unwrap_or(Value::Null))
            }
            "msg.post" => {
                let thread_id = str_arg(&args, "thread_id")?;
                let author = str_arg(&args, "author")?;
                let content = str_arg(&args, "content")?;
                let role = args.get("role").and_then(Value::as_str);
                let metadata = args.get("metadata").cloned();
                let message = facade.msg_post(thread_id, author, content, role, metadata).map_err(to_mcp_error)?;
                Ok(serde_json::to_value(message).unwrap_or(Value::Null))
            }
            "msg.list" => {
                let thread_id = str_arg(&args, "thread_id")?;
                let after_seq = args.get("after_seq").and_then(Value::as_i64).unwrap_or(0);
                let limit = args.get("limit").and_then(Value::as_u64).unwrap_or(100) as u32;
                let include_system_prompt = args.get("include_system_prompt").and_then(Value::as_bool).unwrap_or(true);
                let messages = facade.msg_list(thread_id, after_seq, limit, include_system_prompt).map_err(to_mcp_error)?;
                Ok(serde_json::to_value(messages).unwrap_or(Value::Null))
            }
            "msg.wait" => {
                let thread_id = str_arg(&args, "thread_id")?;
                let after_seq = args.get("after_seq").and_then(Value::as_i64).unwrap_or(0);
                let timeout_ms = args.get("timeout_ms").and_then(Value::as_u64).unwrap_or(30_000);
                // Explicit args win; otherwise fall back to whichever agent
                // last registered/resumed/heartbeat on this connection.
                let explicit = args
                    .get("agent_id")
                    .and_then(Value::as_str)
                    .zip(args.get("token").and_then(Value::as_str))
                    .map(|(a, t)| (a.to_string(), t.to_string()));
                let bound = explicit.or_else(|| self.bound_session());
                let cancel = tokio_util::sync::CancellationToken::new();
                let messages = facade
                    .msg_wait(thread_id, after_seq, timeout_ms, bound.as_ref().map(|(a, _)| a.as_str()), bound.as_ref().map(|(_, t)| t.as_str()), &cancel)
                    .await
                    .map_err(to_mcp_error)?;
                Ok(serde_json::to_value(messages).unwrap_or(Value::Null))
            }
            "agent.register" => {
                let ide = str_arg(&args, "ide")?;
                let model = str_arg(&args, "model")?;
                let description = args.get("description").and_then(Value::as_str).map(str::to_string);
                let capabilities = args.get("capabilities").cloned();
                let display_name = args.get("display_name").and_then(Value::as_str).map(str::to_string);
                let agent = facade.agent_register(ide, model, description, capabilities, display_name).map_err(to_mcp_error)?;
                if let Some(token) = &agent.token {
                    self.bind_session(&agent.id, token);
                }
                Ok(serde_json::to_value(agent).unwrap_or(Value::Null))
            }
            "agent.heartbeat" => {
                let id = str_arg(&args, "id")?;
                let token = str_arg(&args, "token")?;
                let ok = facade.agent_heartbeat(id, token).map_err(to_mcp_error)?;
                if ok {
                    self.bind_session(id, token);
                }
                Ok(json!({"ok": ok}))
            }
            "agent.resume" => {
                let id = str_arg(&args, "id")?;
                let token = str_arg(&args, "token")?;
                let agent = facade.agent_resume(id, token).map_err(to_mcp_error)?;
                self.bind_session(id, token);
                Ok(serde_json::to_value(agent).unwrap_or(Value::Null))
            }
            "agent.unregister" => {
                let id = str_arg(&args, "id")?;
                let token = str_arg(&args, "token")?;
                let ok = facade.agent_unregister(id, token).map_err(to_mcp_error)?;
                if ok {
                    let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
                    if session.as_ref().is_some_and(|b| b.agent_id == id) {
                        *session = None;
                    }
                }
                Ok(json!({"ok": ok}))
            }
            "agent.set_typing" => {
                let id = str_arg(&args, "id")?;
                let token = str_arg(&args, "token")?;
                let thread_id = str_arg(&args, "thread_id")?;
                let ok = facade.agent_set_typing(id, token, thread_id).map_err(to_mcp_error)?;
                Ok(json!({"ok": ok}))
            }
            "agent.list" => {
                let agents = facade.agent_list().map_err(to_mcp_error)?;
                Ok(serde_json::to_value(agents).unwrap_or(Value::Null))
            }
            "bus.config" => Ok(facade.bus_config(env!("CARGO_PKG_VERSION"))),
            other => Err(McpError::invalid_params(format!("unknown tool: {other}"), None)),
        }
    }
}

impl ServerHandler for BusMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo { capabilities: ServerCapabilities::builder().enable_tools().build(), ..ServerInfo::default() }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        async move { Ok(ListToolsResult { tools: TOOLS.iter().map(to_mcp_tool).collect(), next_cursor: None }) }
    }

    async fn call_tool(&self, request: CallToolRequestParam, _context: RequestContext<RoleServer>) -> Result<CallToolResult, McpError> {
        let args = request.arguments.map(|m| Value::Object(m.into_iter().collect())).unwrap_or(Value::Object(serde_json::Map::new()));
        let value = self.dispatch(request.name.as_ref(), args).await?;
        Ok(result_json(value))
    }
}

/// Serves `server` on stdio until the client disconnects. Blocks; intended
/// to be the sole task spawned for the MCP surface.
pub async fn serve_stdio(facade: Arc<Facade>) -> anyhow::Result<()> {
    let server = BusMcpServer::new(facade);
    let running =
        server.serve((tokio::io::stdin(), tokio::io::stdout())).await.map_err(|e| anyhow::anyhow!("MCP server init error: {e}"))?;
    running.waiting().await.map_err(|e| anyhow::anyhow!("MCP server error: {e}"))?;
    Ok(())
}

#[cfg(test)]
#[path = "mcp_tests.rs"]
mod tests;
