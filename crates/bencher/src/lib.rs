use metal_web::handler::method_fn;
use metal_web::router::Route;
use metal_web::validation::{Declarations, ParamSpec};
use metal_web::{Controller, ControllerClass, Metal, MetalConfig, MetalError};
use serde_json::json;

#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    file: TestFile,
}

impl TestCase {
    pub fn new(name: &'static str, file: TestFile) -> Self {
        Self { name, file }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn file(&self) -> &TestFile {
        &self.file
    }
}

#[derive(Debug, Copy, Clone)]
pub struct TestFile {
    file_name: &'static str,
    content: &'static str,
}

impl TestFile {
    pub const fn new(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, content }
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }
}

/// The routes every benchmark runs against.
pub fn routes() -> Vec<Route> {
    vec![
        Route::get("/numbers", "Numbers#getNumbers"),
        Route::get(r"/numbers/{number:-?\d+}", "Numbers#getNumber"),
        Route::post("/numbers", "Numbers#createNumber"),
        Route::get("/letters", "Letters#getLetters"),
        Route::get("/letters/{letter:[a-z]}/words/{word}", "Letters#getWord"),
        Route::get("/files/{path:.+}", "Files#get"),
    ]
}

/// An application serving [`routes`].
///
/// # Errors
///
/// Never in practice: all routes are valid and all handlers registered.
pub fn application() -> Result<Metal, MetalError> {
    let numbers = ControllerClass::new("Numbers")
        .method(
            "getNumbers",
            method_fn(|controller: &mut Controller| {
                controller.validate(
                    &Declarations::new().param("limit", ParamSpec::optional().with_type("positiveNonZeroInt").with_default(10)),
                )?;
                controller.negotiate_format()?;
                let limit = controller.int_param("limit").unwrap_or(0);
                Ok(json!({ "numbers": (1..=limit).collect::<Vec<_>>() }))
            }),
        )
        .method(
            "getNumber",
            method_fn(|controller: &mut Controller| {
                controller.validate(
                    &Declarations::new()
                        .param("number", ParamSpec::required().with_type("int"))
                        .param("favorite", ParamSpec::optional().with_type("flag").with_default(0)),
                )?;
                Ok(json!({
                    "number": controller.int_param("number"),
                    "favorite": controller.int_param("favorite") == Some(1),
                }))
            }),
        )
        .method(
            "createNumber",
            method_fn(|controller: &mut Controller| {
                controller.validate(&Declarations::new().param("number", ParamSpec::required().with_type("nonZeroInt")))?;
                Ok(json!({ "number": controller.int_param("number") }))
            }),
        );

    let letters = ControllerClass::new("Letters")
        .method(
            "getLetters",
            method_fn(|controller: &mut Controller| {
                controller.validate(&Declarations::new())?;
                Ok(('a'..='z').map(String::from).collect::<Vec<_>>())
            }),
        )
        .method(
            "getWord",
            method_fn(|controller: &mut Controller| {
                controller.validate(
                    &Declarations::new()
                        .param("letter", ParamSpec::required().with_type("string"))
                        .param("word", ParamSpec::required().with_type("string")),
                )?;
                Ok(json!({ "word": controller.str_param("word") }))
            }),
        );

    let files = ControllerClass::new("Files").method(
        "get",
        method_fn(|controller: &mut Controller| {
            controller.validate(&Declarations::new().param("path", ParamSpec::required()))?;
            Ok(json!({ "path": controller.str_param("path") }))
        }),
    );

    Metal::builder()
        .config(MetalConfig::new().routes(routes()))
        .class(numbers)
        .class(letters)
        .class(files)
        .build()
}
