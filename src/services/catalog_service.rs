// src/services/catalog_service.rs

use crate::{
    common::{db_utils::PageQuery, error::AppError},
    db::{CommunityRepository, DeliveryRouteRepository, MunicipalityRepository},
    models::{
        community::{
            Community, CommunityInput, CommunityListQuery, CommunityPage, CommunitySearchQuery,
            CreateCommunityPayload, UpdateCommunityPayload, DEFAULT_PACKAGE_COST,
        },
        delivery_route::DeliveryRoute,
        municipality::Municipality,
    },
};

// Dados de referência: rutas, municipios e comunidades
#[derive(Clone)]
pub struct CatalogService {
    route_repo: DeliveryRouteRepository,
    municipality_repo: MunicipalityRepository,
    community_repo: CommunityRepository,
}

fn required_name(raw: Option<String>, field: &str) -> Result<String, AppError> {
    raw.map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("El campo '{}' es obligatorio.", field)))
}

impl CatalogService {
    pub fn new(
        route_repo: DeliveryRouteRepository,
        municipality_repo: MunicipalityRepository,
        community_repo: CommunityRepository,
    ) -> Self {
        Self { route_repo, municipality_repo, community_repo }
    }

    // ---
    // Rutas
    // ---

    pub async fn create_route(&self, name: Option<String>) -> Result<DeliveryRoute, AppError> {
        let name = required_name(name, "nombre")?;
        let route = self.route_repo.create(&name).await?;
        tracing::info!("🛣️ Ruta {} criada", route.id);
        Ok(route)
    }

    pub async fn list_routes(&self) -> Result<Vec<DeliveryRoute>, AppError> {
        self.route_repo.find_all().await
    }

    pub async fn get_route(&self, id: i32) -> Result<DeliveryRoute, AppError> {
        self.route_repo.find_by_id(id).await?.ok_or(AppError::NotFound("Ruta"))
    }

    pub async fn update_route(&self, id: i32, name: Option<String>) -> Result<DeliveryRoute, AppError> {
        let name = required_name(name, "nombre")?;
        self.route_repo.update(id, &name).await?.ok_or(AppError::NotFound("Ruta"))
    }

    // Não apaga ruta ainda referenciada por comunidades ou pedidos
    pub async fn delete_route(&self, id: i32) -> Result<(), AppError> {
        self.get_route(id).await?;
        if self.route_repo.count_references(id).await? > 0 {
            tracing::warn!("Ruta {} ainda em uso, exclusão recusada", id);
            return Err(AppError::ResourceInUse("Ruta"));
        }
        if !self.route_repo.delete(id).await? {
            return Err(AppError::NotFound("Ruta"));
        }
        tracing::info!("🗑️ Ruta {} excluída", id);
        Ok(())
    }

    // ---
    // Municipios
    // ---

    pub async fn list_municipalities(&self) -> Result<Vec<Municipality>, AppError> {
        self.municipality_repo.find_all().await
    }

    pub async fn get_municipality(&self, id: i32) -> Result<Municipality, AppError> {
        self.municipality_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("Municipio"))
    }

    pub async fn create_municipality(&self, name: Option<String>) -> Result<Municipality, AppError> {
        let name = required_name(name, "nombre")?;
        self.municipality_repo.create(&name).await
    }

    // ---
    // Comunidades
    // ---

    async fn ensure_references(&self, route_id: i32, municipality_id: i32) -> Result<(), AppError> {
        self.get_route(route_id).await?;
        self.get_municipality(municipality_id).await?;
        Ok(())
    }

    pub async fn create_community(&self, payload: CreateCommunityPayload) -> Result<Community, AppError> {
        let name = required_name(payload.nombre, "nombre")?;
        let route_id = payload.id_ruta.ok_or_else(|| AppError::BadRequest("La ruta es obligatoria.".into()))?;
        let municipality_id = payload
            .id_municipio
            .ok_or_else(|| AppError::BadRequest("El municipio es obligatorio.".into()))?;

        self.ensure_references(route_id, municipality_id).await?;

        let input = CommunityInput {
            name,
            leader_name: payload.jefa,
            contact: payload.contacto,
            address: payload.direccion,
            package_cost: payload.costo_paquete.unwrap_or(DEFAULT_PACKAGE_COST),
            notes: payload.notas,
            route_id,
            municipality_id,
        };
        let community = self.community_repo.create(&input).await?;
        tracing::info!("🏘️ Comunidade {} criada", community.id);
        Ok(community)
    }

    // Sem `page`/`limit` devolve a lista inteira
    pub async fn list_communities(&self, query: &CommunityListQuery) -> Result<Vec<Community>, AppError> {
        match (query.page, query.limit) {
            (None, None) => self.community_repo.find_all(None, 0).await,
            (page, limit) => {
                let (limit, offset) = PageQuery { page, page_size: limit }.limit_offset();
                self.community_repo.find_all(Some(limit), offset).await
            }
        }
    }

    pub async fn search_communities(&self, query: &CommunitySearchQuery) -> Result<CommunityPage, AppError> {
        let paging = PageQuery { page: query.page, page_size: query.page_size };
        let (limit, offset) = paging.limit_offset();
        let (comunidades, total) = self
            .community_repo
            .search(query.search.as_deref(), limit, offset)
            .await?;

        Ok(CommunityPage {
            comunidades,
            total,
            page: paging.page(),
            page_size: paging.page_size(),
        })
    }

    pub async fn communities_by_route(&self, route_id: i32) -> Result<Vec<Community>, AppError> {
        self.community_repo.find_by_route(route_id).await
    }

    /// Aceita o ID numérico do municipio ou o seu nome.
    pub async fn communities_by_municipality(&self, key: &str) -> Result<Vec<Community>, AppError> {
        let key = key.trim();
        let municipality_id = match key.parse::<i32>() {
            Ok(id) if id > 0 => id,
            Ok(_) => return Err(AppError::InvalidId),
            Err(_) => match self.municipality_repo.find_by_name(key).await? {
                Some(municipality) => municipality.id,
                None => {
                    tracing::warn!("Municipio '{}' não encontrado", key);
                    return Ok(Vec::new());
                }
            },
        };
        self.community_repo.find_by_municipality(municipality_id).await
    }

    pub async fn get_community(&self, id: i32) -> Result<Community, AppError> {
        self.community_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("Comunidad"))
    }

    pub async fn update_community(
        &self,
        id: i32,
        payload: UpdateCommunityPayload,
    ) -> Result<Community, AppError> {
        let current = self.get_community(id).await?;
        let input = CommunityInput::merged(&current, payload);

        if input.route_id != current.route_id || input.municipality_id != current.municipality_id {
            self.ensure_references(input.route_id, input.municipality_id).await?;
        }

        self.community_repo
            .update(id, &input)
            .await?
            .ok_or(AppError::NotFound("Comunidad"))
    }

    pub async fn delete_community(&self, id: i32) -> Result<(), AppError> {
        self.get_community(id).await?;
        if self.community_repo.is_used_by_orders(id).await? {
            return Err(AppError::ResourceInUse("Comunidad"));
        }
        self.community_repo.delete(id).await?;
        tracing::info!("🗑️ Comunidade {} excluída", id);
        Ok(())
    }
}
