//! `EditorHost` (§6, SPEC_FULL §6 SUPPLEMENT): the single seam between
//! this crate and the out-of-scope host editor. Every tool in §6's table
//! that needs the host editor's native APIs calls through here instead of
//! depending on a concrete editor binding.

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;

/// One compiler/log/hierarchy/etc. call into the host editor. Every
/// method takes and returns plain JSON so a concrete binding can be
/// written without this crate knowing its shape.
#[async_trait]
pub trait EditorHost: Send + Sync {
    async fn compile(&self, force_recompile: bool) -> Result<Value>;
    async fn get_logs(&self, filter: Value) -> Result<Value>;
    async fn clear_console(&self) -> Result<()>;
    async fn find_game_objects(&self, criteria: Value) -> Result<Value>;
    async fn get_hierarchy(&self, options: Value) -> Result<Value>;
    async fn run_tests(&self, filter: Value) -> Result<Value>;
    async fn execute_menu_item(&self, path: &str) -> Result<()>;

    /// §5 "Main-thread marshalling": run `f` on the editor's main loop and
    /// await its result. Editor-thread-only tools route their body through
    /// this instead of running inline on the reader task.
    async fn run_on_main_thread(
        &self,
        f: Box<dyn FnOnce() -> Result<Value> + Send>,
    ) -> Result<Value>;
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    //! Test doubles in the same style as the runtime's other in-memory
    //! fakes: a null object that returns stub data, and a recording
    //! object that captures calls for assertions.

    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::EditorHost;
    use crate::Result;

    /// Returns plausible stub data for every call; never touches a real
    /// editor. Safe default for demos and for tools that don't exercise
    /// host behavior.
    #[derive(Default)]
    pub struct NullEditorHost;

    #[async_trait]
    impl EditorHost for NullEditorHost {
        async fn compile(&self, _force_recompile: bool) -> Result<Value> {
            Ok(json!({ "errors": [], "warnings": [] }))
        }

        async fn get_logs(&self, _filter: Value) -> Result<Value> {
            Ok(json!([]))
        }

        async fn clear_console(&self) -> Result<()> {
            Ok(())
        }

        async fn find_game_objects(&self, _criteria: Value) -> Result<Value> {
            Ok(json!([]))
        }

        async fn get_hierarchy(&self, _options: Value) -> Result<Value> {
            Ok(json!({ "name": "Scene", "children": [] }))
        }

        async fn run_tests(&self, _filter: Value) -> Result<Value> {
            Ok(json!({ "passed": 0, "failed": 0, "resultXmlPath": null }))
        }

        async fn execute_menu_item(&self, _path: &str) -> Result<()> {
            Ok(())
        }

        async fn run_on_main_thread(
            &self,
            f: Box<dyn FnOnce() -> Result<Value> + Send>,
        ) -> Result<Value> {
            f()
        }
    }

    /// Records every call it receives, in order, so integration tests can
    /// assert on dispatch behavior without a real editor.
    #[derive(Default)]
    pub struct RecordingEditorHost {
        pub calls: Mutex<Vec<String>>,
    }

    impl RecordingEditorHost {
        pub fn new() -> Self {
            Self::default()
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().expect("calls lock poisoned").push(call.into());
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("calls lock poisoned").clone()
        }
    }

    #[async_trait]
    impl EditorHost for RecordingEditorHost {
        async fn compile(&self, force_recompile: bool) -> Result<Value> {
            self.record(format!("compile(force_recompile={})", force_recompile));
            Ok(json!({ "errors": [], "warnings": [] }))
        }

        async fn get_logs(&self, filter: Value) -> Result<Value> {
            self.record(format!("get_logs({})", filter));
            Ok(json!([]))
        }

        async fn clear_console(&self) -> Result<()> {
            self.record("clear_console()");
            Ok(())
        }

        async fn find_game_objects(&self, criteria: Value) -> Result<Value> {
            self.record(format!("find_game_objects({})", criteria));
            Ok(json!([]))
        }

        async fn get_hierarchy(&self, options: Value) -> Result<Value> {
            self.record(format!("get_hierarchy({})", options));
            Ok(json!({ "name": "Scene", "children": [] }))
        }

        async fn run_tests(&self, filter: Value) -> Result<Value> {
            self.record(format!("run_tests({})", filter));
            Ok(json!({ "passed": 0, "failed": 0, "resultXmlPath": null }))
        }

        async fn execute_menu_item(&self, path: &str) -> Result<()> {
            self.record(format!("execute_menu_item({})", path));
            Ok(())
        }

        async fn run_on_main_thread(
            &self,
            f: Box<dyn FnOnce() -> Result<Value> + Send>,
        ) -> Result<Value> {
            self.record("run_on_main_thread()");
            f()
        }
    }

    #[tokio::test]
    async fn test_null_editor_host_returns_stub_data() {
        let host = NullEditorHost;
        let result = host.compile(false).await.unwrap();
        assert_eq!(result["errors"], json!([]));
    }

    #[tokio::test]
    async fn test_recording_editor_host_captures_calls_in_order() {
        let host = RecordingEditorHost::new();
        host.clear_console().await.unwrap();
        host.execute_menu_item("File/Save").await.unwrap();
        assert_eq!(
            host.calls(),
            vec![
                "clear_console()".to_string(),
                "execute_menu_item(File/Save)".to_string()
            ]
        );
    }
}
