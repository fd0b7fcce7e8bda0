// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android model runtime via JNI.
//
// Requires the Android NDK and the `com.google.mediapipe:tasks-text`
// artifact on the app's classpath. Every runtime call goes through JNI into
// the MediaPipe Java API running on ART.
//
// ## Threading notes
//
// The facade calls these methods from its own serial worker thread, which
// is a native thread unknown to the JVM. Two consequences:
//
// - The thread is attached for the duration of each call. The attach guard
//   detaches it again on return, which also frees every local reference the
//   call created.
// - `FindClass` on a natively attached thread only sees the system class
//   loader, so MediaPipe classes are loaded through the application
//   context's `ClassLoader` instead.

#![cfg(target_os = "android")]

use jni::objects::{GlobalRef, JByteArray, JClass, JFloatArray, JObject, JString, JValue};
use jni::{AttachGuard, JNIEnv, JavaVM};

use textembed_core::error::{Result, TextEmbedError};
use textembed_core::types::{Embedding, EmbeddingResult};

use crate::traits::*;

// ---------------------------------------------------------------------------
// MediaPipe class and signature names
// ---------------------------------------------------------------------------

const BASE_OPTIONS: &str = "com.google.mediapipe.tasks.core.BaseOptions";
const TEXT_EMBEDDER: &str = "com.google.mediapipe.tasks.text.textembedder.TextEmbedder";
const TEXT_EMBEDDER_OPTIONS: &str =
    "com.google.mediapipe.tasks.text.textembedder.TextEmbedder$TextEmbedderOptions";
const EMBEDDING: &str = "com.google.mediapipe.tasks.components.containers.Embedding";

const SIG_BASE_OPTIONS_BUILDER: &str = "Lcom/google/mediapipe/tasks/core/BaseOptions$Builder;";
const SIG_BASE_OPTIONS: &str = "Lcom/google/mediapipe/tasks/core/BaseOptions;";
const SIG_OPTIONS_BUILDER: &str =
    "Lcom/google/mediapipe/tasks/text/textembedder/TextEmbedder$TextEmbedderOptions$Builder;";
const SIG_OPTIONS: &str =
    "Lcom/google/mediapipe/tasks/text/textembedder/TextEmbedder$TextEmbedderOptions;";
const SIG_TEXT_EMBEDDER: &str = "Lcom/google/mediapipe/tasks/text/textembedder/TextEmbedder;";
const SIG_TEXT_EMBEDDER_RESULT: &str =
    "Lcom/google/mediapipe/tasks/text/textembedder/TextEmbedderResult;";
const SIG_EMBEDDING_RESULT: &str = "Lcom/google/mediapipe/tasks/components/containers/EmbeddingResult;";
const SIG_EMBEDDING: &str = "Lcom/google/mediapipe/tasks/components/containers/Embedding;";

// ---------------------------------------------------------------------------
// JNI bootstrap helpers
// ---------------------------------------------------------------------------

/// Obtain the process-wide [`JavaVM`] from the NDK context.
fn java_vm() -> Result<JavaVM> {
    let ctx = ndk_context::android_context();
    // SAFETY: `ctx.vm()` returns the `JavaVM*` set by the NDK glue code.
    // The pointer is guaranteed valid for the lifetime of the process.
    unsafe { JavaVM::from_raw(ctx.vm().cast()) }
        .map_err(|e| TextEmbedError::Bridge(format!("failed to obtain JavaVM: {e}")))
}

/// Attach the current thread for the lifetime of the returned guard.
fn attach(vm: &JavaVM) -> Result<AttachGuard<'_>> {
    vm.attach_current_thread()
        .map_err(|e| TextEmbedError::Bridge(format!("failed to attach JNI thread: {e}")))
}

/// The application `Context` the host registered with the NDK glue.
fn app_context() -> Result<JObject<'static>> {
    let ctx = ndk_context::android_context();
    let ptr = ctx.context();
    if ptr.is_null() {
        return Err(TextEmbedError::Bridge(
            "Android context is null: plugin not attached to an engine".into(),
        ));
    }
    // SAFETY: the NDK guarantees this pointer is a valid global jobject for
    // the hosting Context.
    Ok(unsafe { JObject::from_raw(ptr.cast()) })
}

/// Map a JNI failure into a `TextEmbedError`.
///
/// A pending Java exception is cleared and its message surfaced as
/// `Runtime`, so MediaPipe's own error text reaches the caller verbatim.
/// Anything else is a plumbing problem and becomes `Bridge`.
fn jni_err(env: &mut JNIEnv, context: &str, e: jni::errors::Error) -> TextEmbedError {
    if matches!(e, jni::errors::Error::JavaException) {
        if let Some(message) = take_exception_message(env) {
            return TextEmbedError::Runtime(message);
        }
    }
    TextEmbedError::Bridge(format!("{context}: {e}"))
}

/// Clear the pending exception and return its message (or `toString()`).
fn take_exception_message(env: &mut JNIEnv) -> Option<String> {
    let throwable = env.exception_occurred().ok()?;
    env.exception_clear().ok()?;
    if throwable.is_null() {
        return None;
    }

    let message = env
        .call_method(&throwable, "getMessage", "()Ljava/lang/String;", &[])
        .ok()?
        .l()
        .ok()?;
    let message = if message.is_null() {
        env.call_method(&throwable, "toString", "()Ljava/lang/String;", &[])
            .ok()?
            .l()
            .ok()?
    } else {
        message
    };

    let message = JString::from(message);
    env.get_string(&message).ok().map(String::from)
}

/// Load a class by binary name through the application class loader.
fn load_class<'local>(env: &mut JNIEnv<'local>, name: &str) -> Result<JClass<'local>> {
    let context = app_context()?;

    let loader = env
        .call_method(&context, "getClassLoader", "()Ljava/lang/ClassLoader;", &[])
        .and_then(|v| v.l())
        .map_err(|e| jni_err(env, "getClassLoader", e))?;

    let j_name: JString = env
        .new_string(name)
        .map_err(|e| jni_err(env, "new_string(class name)", e))?;

    let class = env
        .call_method(
            &loader,
            "loadClass",
            "(Ljava/lang/String;)Ljava/lang/Class;",
            &[JValue::Object(&j_name)],
        )
        .and_then(|v| v.l())
        .map_err(|e| jni_err(env, name, e))?;

    Ok(JClass::from(class))
}

// ---------------------------------------------------------------------------
// Java -> Rust conversion
// ---------------------------------------------------------------------------

/// Convert a `components.containers.Embedding` into the core type.
fn read_embedding(env: &mut JNIEnv, embedding: &JObject) -> Result<Embedding> {
    let floats = env
        .call_method(embedding, "floatEmbedding", "()[F", &[])
        .and_then(|v| v.l())
        .map_err(|e| jni_err(env, "Embedding.floatEmbedding", e))?;
    let floats = JFloatArray::from(floats);
    let float_embedding = if floats.is_null() {
        None
    } else {
        let len = env
            .get_array_length(&floats)
            .map_err(|e| jni_err(env, "floatEmbedding length", e))?;
        let mut buf = vec![0f32; len as usize];
        env.get_float_array_region(&floats, 0, &mut buf)
            .map_err(|e| jni_err(env, "floatEmbedding region", e))?;
        // Quantized models report an empty float array.
        (!buf.is_empty()).then_some(buf)
    };

    let bytes = env
        .call_method(embedding, "quantizedEmbedding", "()[B", &[])
        .and_then(|v| v.l())
        .map_err(|e| jni_err(env, "Embedding.quantizedEmbedding", e))?;
    let bytes = JByteArray::from(bytes);
    let quantized_embedding = if bytes.is_null() {
        None
    } else {
        let len = env
            .get_array_length(&bytes)
            .map_err(|e| jni_err(env, "quantizedEmbedding length", e))?;
        let mut buf = vec![0i8; len as usize];
        env.get_byte_array_region(&bytes, 0, &mut buf)
            .map_err(|e| jni_err(env, "quantizedEmbedding region", e))?;
        (!buf.is_empty()).then_some(buf)
    };

    let head_index = env
        .call_method(embedding, "headIndex", "()I", &[])
        .and_then(|v| v.i())
        .map_err(|e| jni_err(env, "Embedding.headIndex", e))?;

    let head_name = env
        .call_method(embedding, "headName", "()Ljava/util/Optional;", &[])
        .and_then(|v| v.l())
        .map_err(|e| jni_err(env, "Embedding.headName", e))?;
    let head_name = read_optional_string(env, &head_name)?;

    Ok(Embedding {
        float_embedding,
        quantized_embedding,
        head_index,
        head_name,
    })
}

/// Unwrap a `java.util.Optional<String>`.
fn read_optional_string(env: &mut JNIEnv, optional: &JObject) -> Result<Option<String>> {
    if optional.is_null() {
        return Ok(None);
    }
    let present = env
        .call_method(optional, "isPresent", "()Z", &[])
        .and_then(|v| v.z())
        .map_err(|e| jni_err(env, "Optional.isPresent", e))?;
    if !present {
        return Ok(None);
    }
    let value = env
        .call_method(optional, "get", "()Ljava/lang/Object;", &[])
        .and_then(|v| v.l())
        .map_err(|e| jni_err(env, "Optional.get", e))?;
    let value = JString::from(value);
    let value = env
        .get_string(&value)
        .map_err(|e| jni_err(env, "get_string(headName)", e))?;
    Ok(Some(value.into()))
}

// ---------------------------------------------------------------------------
// Rust -> Java conversion
// ---------------------------------------------------------------------------

/// Rebuild a Java `Embedding` so it can be handed to `TextEmbedder.cosineSimilarity`.
fn new_java_embedding<'local>(
    env: &mut JNIEnv<'local>,
    embedding: &Embedding,
) -> Result<JObject<'local>> {
    let floats = embedding.float_embedding.as_deref().unwrap_or(&[]);
    let j_floats = env
        .new_float_array(floats.len() as i32)
        .map_err(|e| jni_err(env, "new_float_array", e))?;
    env.set_float_array_region(&j_floats, 0, floats)
        .map_err(|e| jni_err(env, "set_float_array_region", e))?;

    let quantized = embedding.quantized_embedding.as_deref().unwrap_or(&[]);
    let j_bytes = env
        .new_byte_array(quantized.len() as i32)
        .map_err(|e| jni_err(env, "new_byte_array", e))?;
    env.set_byte_array_region(&j_bytes, 0, quantized)
        .map_err(|e| jni_err(env, "set_byte_array_region", e))?;

    let j_head_name = match &embedding.head_name {
        Some(name) => {
            let j_name = env
                .new_string(name)
                .map_err(|e| jni_err(env, "new_string(headName)", e))?;
            env.call_static_method(
                "java/util/Optional",
                "of",
                "(Ljava/lang/Object;)Ljava/util/Optional;",
                &[JValue::Object(&j_name)],
            )
        }
        None => env.call_static_method("java/util/Optional", "empty", "()Ljava/util/Optional;", &[]),
    }
    .and_then(|v| v.l())
    .map_err(|e| jni_err(env, "Optional(headName)", e))?;

    let class = load_class(env, EMBEDDING)?;
    env.call_static_method(
        &class,
        "create",
        format!("([F[BILjava/util/Optional;){SIG_EMBEDDING}"),
        &[
            JValue::Object(&j_floats),
            JValue::Object(&j_bytes),
            JValue::Int(embedding.head_index),
            JValue::Object(&j_head_name),
        ],
    )
    .and_then(|v| v.l())
    .map_err(|e| jni_err(env, "Embedding.create", e))
}

// ---------------------------------------------------------------------------
// Bridge struct
// ---------------------------------------------------------------------------

/// Android implementation of the model runtime.
///
/// The struct is zero-sized; loaded models live on the Java side and are
/// pinned by a global reference inside each [`AndroidTextEmbedder`].
pub struct AndroidBridge;

impl AndroidBridge {
    /// Create a new Android bridge.
    ///
    /// This does **not** touch JNI: the first JNI call happens lazily when
    /// a model is loaded.
    pub fn new() -> Self {
        Self
    }
}

impl Default for AndroidBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformBridge for AndroidBridge {
    fn platform_name(&self) -> &str {
        "Android"
    }
}

impl AssetResolver for AndroidBridge {
    /// MediaPipe reads `modelAssetPath` straight from the APK assets, so the
    /// caller's path is used as-is.
    fn resolve_model(&self, requested: &str) -> Result<String> {
        Ok(requested.to_owned())
    }
}

impl ModelRuntime for AndroidBridge {
    /// Build `BaseOptions` and `TextEmbedderOptions`, then call
    /// `TextEmbedder.createFromOptions(context, options)`.
    fn create_embedder(&self, model_path: &str) -> Result<Box<dyn NativeTextEmbedder>> {
        let vm = java_vm()?;
        let mut env = attach(&vm)?;
        let context = app_context()?;

        tracing::info!(model_path, "Android: creating MediaPipe TextEmbedder");

        // -- BaseOptions.builder().setModelAssetPath(path).build() --------------
        let base_class = load_class(&mut env, BASE_OPTIONS)?;
        let builder = env
            .call_static_method(&base_class, "builder", format!("(){SIG_BASE_OPTIONS_BUILDER}"), &[])
            .and_then(|v| v.l())
            .map_err(|e| jni_err(&mut env, "BaseOptions.builder", e))?;

        let j_path: JString = env
            .new_string(model_path)
            .map_err(|e| jni_err(&mut env, "new_string(model_path)", e))?;
        let builder = env
            .call_method(
                &builder,
                "setModelAssetPath",
                format!("(Ljava/lang/String;){SIG_BASE_OPTIONS_BUILDER}"),
                &[JValue::Object(&j_path)],
            )
            .and_then(|v| v.l())
            .map_err(|e| jni_err(&mut env, "setModelAssetPath", e))?;

        let base_options = env
            .call_method(&builder, "build", format!("(){SIG_BASE_OPTIONS}"), &[])
            .and_then(|v| v.l())
            .map_err(|e| jni_err(&mut env, "BaseOptions.build", e))?;

        // -- TextEmbedderOptions.builder().setBaseOptions(..).build() -----------
        let options_class = load_class(&mut env, TEXT_EMBEDDER_OPTIONS)?;
        let builder = env
            .call_static_method(&options_class, "builder", format!("(){SIG_OPTIONS_BUILDER}"), &[])
            .and_then(|v| v.l())
            .map_err(|e| jni_err(&mut env, "TextEmbedderOptions.builder", e))?;

        let builder = env
            .call_method(
                &builder,
                "setBaseOptions",
                format!("({SIG_BASE_OPTIONS}){SIG_OPTIONS_BUILDER}"),
                &[JValue::Object(&base_options)],
            )
            .and_then(|v| v.l())
            .map_err(|e| jni_err(&mut env, "setBaseOptions", e))?;

        let options = env
            .call_method(&builder, "build", format!("(){SIG_OPTIONS}"), &[])
            .and_then(|v| v.l())
            .map_err(|e| jni_err(&mut env, "TextEmbedderOptions.build", e))?;

        // -- TextEmbedder.createFromOptions(context, options) -------------------
        let embedder_class = load_class(&mut env, TEXT_EMBEDDER)?;
        let embedder = env
            .call_static_method(
                &embedder_class,
                "createFromOptions",
                format!("(Landroid/content/Context;{SIG_OPTIONS}){SIG_TEXT_EMBEDDER}"),
                &[JValue::Object(&context), JValue::Object(&options)],
            )
            .and_then(|v| v.l())
            .map_err(|e| jni_err(&mut env, "TextEmbedder.createFromOptions", e))?;

        let embedder = env
            .new_global_ref(&embedder)
            .map_err(|e| jni_err(&mut env, "new_global_ref(TextEmbedder)", e))?;

        Ok(Box::new(AndroidTextEmbedder { embedder }))
    }

    /// `TextEmbedder.cosineSimilarity(Embedding, Embedding)`.
    fn cosine_similarity(&self, a: &Embedding, b: &Embedding) -> Result<f64> {
        let vm = java_vm()?;
        let mut env = attach(&vm)?;

        let j_a = new_java_embedding(&mut env, a)?;
        let j_b = new_java_embedding(&mut env, b)?;

        let class = load_class(&mut env, TEXT_EMBEDDER)?;
        env.call_static_method(
            &class,
            "cosineSimilarity",
            format!("({SIG_EMBEDDING}{SIG_EMBEDDING})D"),
            &[JValue::Object(&j_a), JValue::Object(&j_b)],
        )
        .and_then(|v| v.d())
        .map_err(|e| jni_err(&mut env, "TextEmbedder.cosineSimilarity", e))
    }
}

// ---------------------------------------------------------------------------
// Loaded model handle
// ---------------------------------------------------------------------------

/// A live `TextEmbedder` pinned by a JNI global reference.
pub struct AndroidTextEmbedder {
    embedder: GlobalRef,
}

impl NativeTextEmbedder for AndroidTextEmbedder {
    /// `embedder.embed(text).embeddingResult().embeddings()`.
    fn embed(&mut self, text: &str) -> Result<EmbeddingResult> {
        let vm = java_vm()?;
        let mut env = attach(&vm)?;

        let j_text: JString = env
            .new_string(text)
            .map_err(|e| jni_err(&mut env, "new_string(text)", e))?;

        let result = env
            .call_method(
                self.embedder.as_obj(),
                "embed",
                format!("(Ljava/lang/String;){SIG_TEXT_EMBEDDER_RESULT}"),
                &[JValue::Object(&j_text)],
            )
            .and_then(|v| v.l())
            .map_err(|e| jni_err(&mut env, "TextEmbedder.embed", e))?;

        let timestamp_ms = env
            .call_method(&result, "timestampMs", "()J", &[])
            .and_then(|v| v.j())
            .map_err(|e| jni_err(&mut env, "TextEmbedderResult.timestampMs", e))?;

        let container = env
            .call_method(&result, "embeddingResult", format!("(){SIG_EMBEDDING_RESULT}"), &[])
            .and_then(|v| v.l())
            .map_err(|e| jni_err(&mut env, "TextEmbedderResult.embeddingResult", e))?;

        let list = env
            .call_method(&container, "embeddings", "()Ljava/util/List;", &[])
            .and_then(|v| v.l())
            .map_err(|e| jni_err(&mut env, "EmbeddingResult.embeddings", e))?;

        let count = env
            .call_method(&list, "size", "()I", &[])
            .and_then(|v| v.i())
            .map_err(|e| jni_err(&mut env, "List.size", e))?;

        let mut embeddings = Vec::with_capacity(count.max(0) as usize);
        for i in 0..count {
            let item = env
                .call_method(&list, "get", "(I)Ljava/lang/Object;", &[JValue::Int(i)])
                .and_then(|v| v.l())
                .map_err(|e| jni_err(&mut env, "List.get", e))?;
            embeddings.push(read_embedding(&mut env, &item)?);
        }

        tracing::debug!(heads = embeddings.len(), "Android: embedding computed");

        Ok(EmbeddingResult {
            embeddings,
            timestamp_ms: Some(timestamp_ms),
        })
    }

    fn close(self: Box<Self>) -> Result<()> {
        let vm = java_vm()?;
        let mut env = attach(&vm)?;

        env.call_method(self.embedder.as_obj(), "close", "()V", &[])
            .map_err(|e| jni_err(&mut env, "TextEmbedder.close", e))?;

        tracing::info!("Android: TextEmbedder closed");
        Ok(())
    }
}
