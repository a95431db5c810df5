// src/services/storage_service.rs

use std::path::PathBuf;

use async_trait::async_trait;

use crate::common::error::AppError;

/// Destino dos arquivos gerados. Devolve a URL pública do arquivo.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn upload(
        &self,
        folder: &[String],
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, AppError>;
}

// Nomes de pasta/arquivo vindos do banco não podem escapar do diretório
pub fn sanitize_segment(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '-' } else { c })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

// Segmentos saneados e com percent-encoding, unidos por "/"
fn url_path(folder: &[String], file_name: &str) -> String {
    folder
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(file_name))
        .map(|segment| urlencoding::encode(&sanitize_segment(segment)).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

// ---
// Disco local
// ---

pub struct LocalStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalStorage {
    pub fn new(root: PathBuf, public_base_url: String) -> Self {
        Self { root, public_base_url }
    }
}

#[async_trait]
impl FileStorage for LocalStorage {
    async fn upload(
        &self,
        folder: &[String],
        file_name: &str,
        _content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, AppError> {
        let mut dir = self.root.clone();
        for segment in folder {
            dir.push(sanitize_segment(segment));
        }

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::StorageError(format!("{}: {}", dir.display(), e)))?;

        let path = dir.join(sanitize_segment(file_name));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::StorageError(format!("{}: {}", path.display(), e)))?;

        tracing::info!("📁 Arquivo salvo em {}", path.display());
        Ok(format!("{}/{}", self.public_base_url.trim_end_matches('/'), url_path(folder, file_name)))
    }
}

// ---
// Object store via HTTP PUT autenticado
// ---

pub struct HttpStorage {
    client: reqwest::Client,
    upload_url: String,
    token: Option<String>,
    public_base_url: String,
}

impl HttpStorage {
    pub fn new(upload_url: String, token: Option<String>, public_base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            upload_url,
            token,
            public_base_url,
        }
    }
}

#[async_trait]
impl FileStorage for HttpStorage {
    async fn upload(
        &self,
        folder: &[String],
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, AppError> {
        let path = url_path(folder, file_name);
        let target = format!("{}/{}", self.upload_url.trim_end_matches('/'), path);

        let mut request = self
            .client
            .put(&target)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::StorageError(format!("Erro de rede: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::StorageError(format!("Upload respondeu {}: {}", status.as_u16(), body)));
        }

        tracing::info!("☁️ Arquivo enviado para {}", target);
        let base = if self.public_base_url.is_empty() { &self.upload_url } else { &self.public_base_url };
        Ok(format!("{}/{}", base.trim_end_matches('/'), path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_hash_spaces_and_accents() {
        let folder = vec!["Tepatitlán".to_string(), "marzo 2025".to_string()];
        assert_eq!(
            url_path(&folder, "cobranza_pedido#3_Ruta Norte.pdf"),
            "Tepatitl%C3%A1n/marzo%202025/cobranza_pedido%233_Ruta%20Norte.pdf"
        );
    }

    #[test]
    fn sanitizes_path_traversal() {
        assert_eq!(sanitize_segment("../etc"), "..-etc");
        assert_eq!(sanitize_segment(".."), "_");
        assert_eq!(sanitize_segment(" Ruta/Sur "), "Ruta-Sur");
    }

    #[tokio::test]
    async fn local_storage_writes_file_and_returns_public_url() {
        let root = std::env::temp_dir().join(format!("bamx-storage-{}", uuid::Uuid::new_v4()));
        let storage = LocalStorage::new(root.clone(), "http://localhost:3000/archivos/".into());
        let folder = vec!["Ruta Norte".to_string(), "marzo 2025".to_string()];

        let url = storage
            .upload(&folder, "recibo#1.pdf", "application/pdf", b"%PDF-1.4".to_vec())
            .await
            .unwrap();

        assert_eq!(url, "http://localhost:3000/archivos/Ruta%20Norte/marzo%202025/recibo%231.pdf");
        let written = tokio::fs::read(root.join("Ruta Norte").join("marzo 2025").join("recibo#1.pdf"))
            .await
            .unwrap();
        assert_eq!(written, b"%PDF-1.4");

        tokio::fs::remove_dir_all(root).await.ok();
    }
}
