pub type AppResult<T> = Result<T, AppError>;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },
    #[error("PDF render failed for page {page}")]
    PdfRender {
        page: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("PDF parse failed: {context}")]
    PdfParse {
        context: String,
        #[source]
        source: Option<lopdf::Error>,
    },
    #[error("PDF write failed: {context}")]
    PdfWrite {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("image error: {context}")]
    Image {
        context: String,
        #[source]
        source: image::ImageError,
    },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl From<std::io::Error> for AppError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            context: "I/O operation failed".to_string(),
        }
    }
}

impl AppError {
    pub fn io_with_context(source: std::io::Error, context: impl Into<String>) -> Self {
        Self::Io {
            source,
            context: context.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn pdf_render(page: usize, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::PdfRender {
            page,
            source: Box::new(source),
        }
    }

    pub fn pdf_parse(context: impl Into<String>, source: lopdf::Error) -> Self {
        Self::PdfParse {
            context: context.into(),
            source: Some(source),
        }
    }

    pub fn pdf_structure(context: impl Into<String>) -> Self {
        Self::PdfParse {
            context: context.into(),
            source: None,
        }
    }

    pub fn pdf_write(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::PdfWrite {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub fn image(source: image::ImageError, context: impl Into<String>) -> Self {
        Self::Image {
            context: context.into(),
            source,
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }
}
