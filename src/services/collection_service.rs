// src/services/collection_service.rs

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{CollectionRepository, OrderRepository},
    models::{
        auth::User,
        collection::{Collection, GenerateCollectionPayload, NewCollection},
        order::OrderDetail,
    },
    services::{
        document_service::{DocumentService, ReceiptData},
        order_service::OrderService,
        storage_service::FileStorage,
    },
};

const MONTHS: [&str; 12] = [
    "enero", "febrero", "marzo", "abril", "mayo", "junio",
    "julio", "agosto", "septiembre", "octubre", "noviembre", "diciembre",
];

pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTHS.get(i as usize))
        .copied()
        .unwrap_or("")
}

// Pasta "<ruta>/<mes año>" onde o recibo é publicado
pub fn receipt_folder(route: &str, date: NaiveDate) -> Vec<String> {
    vec![route.to_string(), format!("{} {}", month_name(date.month()), date.year())]
}

pub fn receipt_file_name(order_id: i32, route: &str, date: NaiveDate) -> String {
    format!("cobranza_pedido#{}_{}_{}.pdf", order_id, route, date.format("%Y-%m-%d"))
}

#[derive(Debug, Clone)]
pub struct GeneratedCollection {
    pub collection: Collection,
    pub url: String,
}

#[derive(Clone)]
pub struct CollectionService {
    pool: PgPool,
    order_service: OrderService,
    order_repo: OrderRepository,
    repo: CollectionRepository,
    documents: DocumentService,
    storage: Arc<dyn FileStorage>,
}

impl CollectionService {
    pub fn new(
        pool: PgPool,
        order_service: OrderService,
        order_repo: OrderRepository,
        repo: CollectionRepository,
        documents: DocumentService,
        storage: Arc<dyn FileStorage>,
    ) -> Self {
        Self { pool, order_service, order_repo, repo, documents, storage }
    }

    fn render(&self, order: &OrderDetail, extras: &GenerateCollectionPayload) -> Result<(ReceiptData, Vec<u8>), AppError> {
        let data = ReceiptData::build(order, extras, Utc::now().date_naive());
        let pdf = self.documents.render_receipt(&data)?;
        Ok((data, pdf))
    }

    /// Gera o PDF, publica no storage e só então grava no banco.
    pub async fn generate(
        &self,
        order_id: i32,
        caller: &User,
        extras: GenerateCollectionPayload,
    ) -> Result<GeneratedCollection, AppError> {
        let order = self.order_service.get_detail(order_id).await?;
        if order.order.collection_generated {
            tracing::warn!("Cobranza do pedido {} já foi gerada", order_id);
            return Err(AppError::CollectionAlreadyGenerated(order_id));
        }

        let (data, pdf) = self.render(&order, &extras)?;

        let route = order.order.route_name.as_deref().unwrap_or("Sin ruta");
        let file_name = receipt_file_name(order_id, route, order.order.delivery_date);
        let folder = receipt_folder(route, order.order.delivery_date);
        let url = self
            .storage
            .upload(&folder, &file_name, "application/pdf", pdf)
            .await?;

        let new = NewCollection {
            order_id,
            file_name,
            file_url: url.clone(),
            arpillas_quantity: extras.arpillas_cantidad,
            arpillas_amount: extras.arpillas_importe,
            surplus_quantity: extras.excedentes,
            surplus_amount: extras.excedentes_importe,
            total_recovered: data.total_recovered,
            generated_by: caller.id,
        };

        let mut tx = self.pool.begin().await?;
        if !self.order_repo.claim_collection(&mut *tx, order_id, &url).await? {
            tracing::warn!("Cobranza do pedido {} gerada por outra requisição; {} descartado", order_id, url);
            return Err(AppError::CollectionAlreadyGenerated(order_id));
        }
        let id = self.repo.insert(&mut *tx, &new).await?;
        tx.commit().await?;

        tracing::info!("🧾 Cobranza {} gerada para o pedido {} por {}", id, order_id, caller.id);
        let collection = self.get(id).await?;
        Ok(GeneratedCollection { collection, url })
    }

    // Mesmo PDF, sem publicar nem gravar nada
    pub async fn preview(&self, order_id: i32, extras: GenerateCollectionPayload) -> Result<Vec<u8>, AppError> {
        let order = self.order_service.get_detail(order_id).await?;
        let (_, pdf) = self.render(&order, &extras)?;
        Ok(pdf)
    }

    pub async fn list(&self) -> Result<Vec<Collection>, AppError> {
        self.repo.find_all().await
    }

    pub async fn get(&self, id: i32) -> Result<Collection, AppError> {
        self.repo.find_by_id(id).await?.ok_or(AppError::NotFound("Cobranza"))
    }

    pub async fn by_order(&self, order_id: i32) -> Result<Vec<Collection>, AppError> {
        self.repo.find_by_order(order_id).await
    }

    // Sem cobranzas restantes o pedido volta a poder gerar recibo
    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        let collection = self.get(id).await?;

        let mut tx = self.pool.begin().await?;
        if !self.repo.delete(&mut *tx, id).await? {
            return Err(AppError::NotFound("Cobranza"));
        }
        if self.repo.count_by_order(&mut *tx, collection.order_id).await? == 0 {
            self.order_repo.clear_collection(&mut *tx, collection.order_id).await?;
        }
        tx.commit().await?;

        tracing::info!("🗑️ Cobranza {} excluída", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, "enero")]
    #[case(9, "septiembre")]
    #[case(12, "diciembre")]
    #[case(0, "")]
    #[case(13, "")]
    fn spanish_month_names(#[case] month: u32, #[case] expected: &str) {
        assert_eq!(month_name(month), expected);
    }

    #[test]
    fn file_and_folder_follow_delivery_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();

        assert_eq!(
            receipt_file_name(12, "Ruta Norte", date),
            "cobranza_pedido#12_Ruta Norte_2025-03-07.pdf"
        );
        assert_eq!(receipt_folder("Ruta Norte", date), vec!["Ruta Norte".to_string(), "marzo 2025".to_string()]);
    }
}
