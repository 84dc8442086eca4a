// [libs/infra/catalog/src/repositories/model.rs]
/*!
 * =================================================================
 * APARATO: MODEL REGISTRY REPOSITORY (V42.0 - PROMOTION SEALED)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: REGISTRO, BASELINES Y TRANSACCIÓN DE PROMOCIÓN
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ATOMIC CROWN SWAP: promote_to_production verifica STAGING, degrada
 *    al PRODUCTION vigente con razón 'superseded' y corona al objetivo
 *    dentro de UNA transacción; todo o nada.
 * 2. BASELINE GATE: La promoción exige la satisfacción de todos los
 *    baselines activos; los infractores se listan en el rechazo.
 * 3. FEED DISCIPLINE: 'ModelActivated' se publica ÚNICAMENTE tras el
 *    commit, transportando schema hash + referencia portable + checksum.
 *
 * # Mathematical Proof (Single Production):
 * Dentro de la transacción el swap degrada primero y corona después; el
 * índice único parcial idx_models_single_production rechaza cualquier
 * historia que intente materializar dos filas PRODUCTION simultáneas.
 * =================================================================
 */

use crate::client::CatalogClient;
use crate::errors::CatalogError;
use crate::feed::CatalogFeed;
use crate::repositories::{parse_identifier, parse_json_column, parse_timestamp, to_json_column};
use aegis_domain_models::{
    AlgorithmKind, Baseline, BaselineOperator, ControlPlaneEvent, FeatureWeight, ModelMetrics,
    ModelRecord, ModelStage,
};
use chrono::Utc;
use libsql::{params, Row};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Baseline infractor reportado en un rechazo de promoción.
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineNotMet {
    /// Métrica vigilada.
    pub metric_name: String,
    /// Umbral exigido.
    pub threshold: f64,
    /// Valor observado en el candidato.
    pub observed: f64,
}

/// Repositorio de autoridad única para el registro de modelos.
pub struct ModelRepository {
    catalog_client: CatalogClient,
    change_feed: CatalogFeed,
}

const MODEL_PROJECTION: &str =
    "SELECT id, algorithm, hyperparameters_json, feature_set_id, schema_hash, metrics_json, \
     importance_json, feature_names_json, native_artifact_reference, portable_artifact_reference, \
     checksum_hexadecimal, stage, archived_reason, promoted_at, trained_at, created_at FROM models";

impl ModelRepository {
    /// Inicializa una nueva instancia del repositorio.
    pub fn new(catalog_client: CatalogClient, change_feed: CatalogFeed) -> Self {
        Self { catalog_client, change_feed }
    }

    /// Registra atómicamente un modelo recién entrenado en estado TRAINED.
    #[instrument(skip(self, model))]
    pub async fn register_trained(&self, model: &ModelRecord) -> Result<(), CatalogError> {
        if model.stage != ModelStage::Trained {
            return Err(CatalogError::Validation(
                "freshly registered models must enter in TRAINED".into(),
            ));
        }

        let connection = self.catalog_client.get_connection()?;
        connection
            .execute(
                r#"
                INSERT INTO models (
                    id, algorithm, hyperparameters_json, feature_set_id, schema_hash,
                    metrics_json, importance_json, feature_names_json,
                    native_artifact_reference, portable_artifact_reference,
                    checksum_hexadecimal, stage, trained_at, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 'TRAINED', ?12, ?13)
                "#,
                params![
                    model.id.to_string(),
                    model.algorithm.canonical_tag(),
                    to_json_column(&model.hyperparameters, "hyperparameters_json")?,
                    model.feature_set_id.to_string(),
                    model.schema_hash.clone(),
                    to_json_column(&model.metrics, "metrics_json")?,
                    to_json_column(&model.feature_importance, "importance_json")?,
                    to_json_column(&model.feature_names, "feature_names_json")?,
                    model.native_artifact_reference.clone(),
                    model.portable_artifact_reference.clone(),
                    model.checksum_hexadecimal.clone(),
                    model.trained_at.to_rfc3339(),
                    model.created_at.to_rfc3339(),
                ],
            )
            .await?;

        info!("🏷️  [REGISTRY]: Model {} registered as TRAINED.", model.id);
        Ok(())
    }

    /// Transición CAS de etapa con validación del retículo de ciclo de vida.
    #[instrument(skip(self))]
    pub async fn patch_stage(
        &self,
        model_id: Uuid,
        from_stage: ModelStage,
        to_stage: ModelStage,
    ) -> Result<(), CatalogError> {
        if !from_stage.can_transition_to(to_stage) {
            return Err(CatalogError::ConflictingState {
                entity: format!("model {}", model_id),
                expected: format!("legal transition from {}", from_stage.canonical_tag()),
                observed: format!("illegal target {}", to_stage.canonical_tag()),
            });
        }
        if to_stage == ModelStage::Production {
            return Err(CatalogError::Validation(
                "PRODUCTION is only reachable through promote_to_production".into(),
            ));
        }

        let connection = self.catalog_client.get_connection()?;
        let rows_affected = connection
            .execute(
                "UPDATE models SET stage = ?3 WHERE id = ?1 AND stage = ?2",
                params![
                    model_id.to_string(),
                    from_stage.canonical_tag(),
                    to_stage.canonical_tag(),
                ],
            )
            .await?;

        if rows_affected == 0 {
            return Err(CatalogError::ConflictingState {
                entity: format!("model {}", model_id),
                expected: from_stage.canonical_tag().to_string(),
                observed: self.observed_stage(model_id).await?,
            });
        }
        Ok(())
    }

    /**
     * Transacción de promoción a PRODUCTION.
     *
     * Secuencia sellada: (1) verificar STAGING del objetivo y baselines,
     * (2) degradar al PRODUCTION vigente a ARCHIVED con razón 'superseded',
     * (3) coronar al objetivo con 'promoted_at'. Commit único.
     *
     * # Errors:
     * - `ConflictingState` si el objetivo no está en STAGING.
     * - `BaselinesNotMet` listando las métricas infractoras.
     */
    #[instrument(skip(self))]
    pub async fn promote_to_production(&self, model_id: Uuid) -> Result<ModelRecord, CatalogError> {
        let target_model = self.get(model_id).await?;

        if target_model.stage != ModelStage::Staging
            && target_model.stage != ModelStage::Archived
        {
            return Err(CatalogError::ConflictingState {
                entity: format!("model {}", model_id),
                expected: "STAGING".into(),
                observed: target_model.stage.canonical_tag().to_string(),
            });
        }

        // Puerta de baselines previa a la transacción de corona.
        let offending = self.unmet_baselines(model_id, &target_model.metrics).await?;
        if !offending.is_empty() {
            let offenders: Vec<String> = offending
                .iter()
                .map(|entry| {
                    format!(
                        "{} (threshold {}, observed {:.4})",
                        entry.metric_name, entry.threshold, entry.observed
                    )
                })
                .collect();
            return Err(CatalogError::BaselinesNotMet(offenders));
        }

        let promoted_at = Utc::now();
        let connection = self.catalog_client.get_connection()?;
        let transaction =
            connection.transaction().await.map_err(|_| CatalogError::TransactionError)?;

        // (2) Degradación del campeón vigente (si existe).
        transaction
            .execute(
                "UPDATE models SET stage = 'ARCHIVED', archived_reason = 'superseded' \
                 WHERE stage = 'PRODUCTION' AND id != ?1",
                params![model_id.to_string()],
            )
            .await?;

        // (3) Coronación del objetivo con guardia de etapa re-verificada.
        let rows_affected = transaction
            .execute(
                "UPDATE models SET stage = 'PRODUCTION', archived_reason = NULL, promoted_at = ?2 \
                 WHERE id = ?1 AND stage = ?3",
                params![
                    model_id.to_string(),
                    promoted_at.to_rfc3339(),
                    target_model.stage.canonical_tag(),
                ],
            )
            .await?;

        if rows_affected == 0 {
            // El CAS interior perdió contra una transición concurrente.
            return Err(CatalogError::ConflictingState {
                entity: format!("model {}", model_id),
                expected: target_model.stage.canonical_tag().to_string(),
                observed: "concurrent transition".into(),
            });
        }

        transaction.commit().await.map_err(|_| CatalogError::TransactionError)?;

        info!("👑 [REGISTRY]: Model {} crowned as PRODUCTION.", model_id);

        // Difusión post-commit de la activación atómica.
        self.change_feed.publish(ControlPlaneEvent::ModelActivated {
            model_id,
            schema_hash: target_model.schema_hash.clone(),
            portable_artifact_reference: target_model.portable_artifact_reference.clone(),
            checksum_hexadecimal: target_model.checksum_hexadecimal.clone(),
            promoted_at,
        });

        let mut crowned = target_model;
        crowned.stage = ModelStage::Production;
        crowned.promoted_at = Some(promoted_at);
        crowned.archived_reason = None;
        Ok(crowned)
    }

    /// Retira explícitamente el modelo PRODUCTION vigente.
    #[instrument(skip(self))]
    pub async fn retire_production(
        &self,
        model_id: Uuid,
        archived_reason: &str,
    ) -> Result<(), CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let rows_affected = connection
            .execute(
                "UPDATE models SET stage = 'ARCHIVED', archived_reason = ?2 \
                 WHERE id = ?1 AND stage = 'PRODUCTION'",
                params![model_id.to_string(), archived_reason],
            )
            .await?;

        if rows_affected == 0 {
            return Err(CatalogError::ConflictingState {
                entity: format!("model {}", model_id),
                expected: "PRODUCTION".into(),
                observed: self.observed_stage(model_id).await?,
            });
        }

        self.change_feed.publish(ControlPlaneEvent::ModelRetired {
            model_id,
            reason: archived_reason.to_string(),
        });
        Ok(())
    }

    /**
     * Sella un modelo como corrupto (carga con checksum inválido) y retorna
     * el candidato de rollback: el ARCHIVED 'superseded' más reciente.
     */
    #[instrument(skip(self))]
    pub async fn mark_corrupted(&self, model_id: Uuid) -> Result<Option<Uuid>, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        connection
            .execute(
                "UPDATE models SET stage = 'ARCHIVED', archived_reason = 'corrupted' \
                 WHERE id = ?1",
                params![model_id.to_string()],
            )
            .await?;
        warn!("☣️  [REGISTRY]: Model {} sealed as corrupted.", model_id);

        let mut query_results = connection
            .query(
                "SELECT id FROM models WHERE stage = 'ARCHIVED' AND archived_reason = 'superseded' \
                 AND id != ?1 ORDER BY promoted_at DESC LIMIT 1",
                params![model_id.to_string()],
            )
            .await?;

        match query_results.next().await? {
            Some(row) => Ok(Some(parse_identifier(&row.get::<String>(0)?)?)),
            None => Ok(None),
        }
    }

    /// Modelo PRODUCTION vigente (si existe).
    pub async fn current_production(&self) -> Result<Option<ModelRecord>, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query(&format!("{} WHERE stage = 'PRODUCTION' LIMIT 1", MODEL_PROJECTION), ())
            .await?;
        match query_results.next().await? {
            Some(row) => Ok(Some(map_row_to_model(&row)?)),
            None => Ok(None),
        }
    }

    /// Recupera un modelo por identificador.
    pub async fn get(&self, model_id: Uuid) -> Result<ModelRecord, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query(
                &format!("{} WHERE id = ?1", MODEL_PROJECTION),
                params![model_id.to_string()],
            )
            .await?;
        let data_row = query_results
            .next()
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("model {}", model_id)))?;
        map_row_to_model(&data_row)
    }

    /// Lista modelos por etapa con paginación simple.
    pub async fn list(
        &self,
        stage_filter: Option<ModelStage>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ModelRecord>, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = match stage_filter {
            Some(stage) => {
                connection
                    .query(
                        &format!(
                            "{} WHERE stage = ?1 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
                            MODEL_PROJECTION
                        ),
                        params![stage.canonical_tag(), limit as i64, offset as i64],
                    )
                    .await?
            }
            None => {
                connection
                    .query(
                        &format!(
                            "{} ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
                            MODEL_PROJECTION
                        ),
                        params![limit as i64, offset as i64],
                    )
                    .await?
            }
        };

        let mut models = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            models.push(map_row_to_model(&data_row)?);
        }
        Ok(models)
    }

    // --- ESTRATO DE BASELINES ---

    /// Define o reemplaza un baseline (único por (model, metric)).
    #[instrument(skip(self))]
    pub async fn set_baseline(&self, baseline: &Baseline) -> Result<(), CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        connection
            .execute(
                "INSERT INTO baselines (model_id, metric_name, threshold, operator) \
                 VALUES (?1, ?2, ?3, ?4) \
                 ON CONFLICT(model_id, metric_name) DO UPDATE SET threshold = ?3, operator = ?4",
                params![
                    baseline.model_id.to_string(),
                    baseline.metric_name.clone(),
                    baseline.threshold,
                    operator_tag(baseline.operator),
                ],
            )
            .await?;
        Ok(())
    }

    /// Baselines activos de un modelo.
    pub async fn baselines_of(&self, model_id: Uuid) -> Result<Vec<Baseline>, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query(
                "SELECT model_id, metric_name, threshold, operator FROM baselines \
                 WHERE model_id = ?1 ORDER BY metric_name",
                params![model_id.to_string()],
            )
            .await?;

        let mut baselines = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            baselines.push(Baseline {
                model_id: parse_identifier(&data_row.get::<String>(0)?)?,
                metric_name: data_row.get(1)?,
                threshold: data_row.get(2)?,
                operator: parse_operator(&data_row.get::<String>(3)?)?,
            });
        }
        Ok(baselines)
    }

    /// Baselines no satisfechos por un set de métricas.
    pub async fn unmet_baselines(
        &self,
        model_id: Uuid,
        metrics: &ModelMetrics,
    ) -> Result<Vec<BaselineNotMet>, CatalogError> {
        let baselines = self.baselines_of(model_id).await?;
        Ok(baselines
            .into_iter()
            .filter(|baseline| !baseline.is_met_by(metrics))
            .map(|baseline| BaselineNotMet {
                observed: metrics.metric_by_name(&baseline.metric_name).unwrap_or(f64::NAN),
                metric_name: baseline.metric_name,
                threshold: baseline.threshold,
            })
            .collect())
    }

    /// Etapa observada para mensajes de conflicto.
    async fn observed_stage(&self, model_id: Uuid) -> Result<String, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query("SELECT stage FROM models WHERE id = ?1", params![model_id.to_string()])
            .await?;
        match query_results.next().await? {
            Some(row) => Ok(row.get::<String>(0)?),
            None => Err(CatalogError::NotFound(format!("model {}", model_id))),
        }
    }
}

/// Etiqueta canónica del operador de baseline.
fn operator_tag(operator: BaselineOperator) -> &'static str {
    match operator {
        BaselineOperator::GreaterOrEqual => ">=",
        BaselineOperator::LessOrEqual => "<=",
        BaselineOperator::Greater => ">",
        BaselineOperator::Less => "<",
        BaselineOperator::Equal => "=",
    }
}

/// Parsea la etiqueta del operador de baseline.
fn parse_operator(raw: &str) -> Result<BaselineOperator, CatalogError> {
    match raw {
        ">=" => Ok(BaselineOperator::GreaterOrEqual),
        "<=" => Ok(BaselineOperator::LessOrEqual),
        ">" => Ok(BaselineOperator::Greater),
        "<" => Ok(BaselineOperator::Less),
        "=" => Ok(BaselineOperator::Equal),
        other => Err(CatalogError::MappingError(format!("unknown operator '{}'", other))),
    }
}

/// Parsea la etiqueta del algoritmo.
fn parse_algorithm(raw: &str) -> Result<AlgorithmKind, CatalogError> {
    match raw {
        "isolation_forest" => Ok(AlgorithmKind::IsolationForest),
        "xgboost_like" => Ok(AlgorithmKind::XgboostLike),
        "lightgbm_like" => Ok(AlgorithmKind::LightgbmLike),
        "random_forest" => Ok(AlgorithmKind::RandomForest),
        "small_nn" => Ok(AlgorithmKind::SmallNn),
        other => Err(CatalogError::MappingError(format!("unknown algorithm '{}'", other))),
    }
}

/// Parsea la etiqueta de etapa.
fn parse_stage(raw: &str) -> Result<ModelStage, CatalogError> {
    match raw {
        "TRAINED" => Ok(ModelStage::Trained),
        "STAGING" => Ok(ModelStage::Staging),
        "PRODUCTION" => Ok(ModelStage::Production),
        "ARCHIVED" => Ok(ModelStage::Archived),
        other => Err(CatalogError::MappingError(format!("unknown stage '{}'", other))),
    }
}

/// Transforma una fila de persistencia en la entidad de dominio.
fn map_row_to_model(data_row: &Row) -> Result<ModelRecord, CatalogError> {
    let importance: Vec<FeatureWeight> =
        parse_json_column(&data_row.get::<String>(6)?, "importance_json")?;
    Ok(ModelRecord {
        id: parse_identifier(&data_row.get::<String>(0)?)?,
        algorithm: parse_algorithm(&data_row.get::<String>(1)?)?,
        hyperparameters: parse_json_column(&data_row.get::<String>(2)?, "hyperparameters_json")?,
        feature_set_id: parse_identifier(&data_row.get::<String>(3)?)?,
        schema_hash: data_row.get(4)?,
        metrics: parse_json_column(&data_row.get::<String>(5)?, "metrics_json")?,
        feature_importance: importance,
        feature_names: parse_json_column(&data_row.get::<String>(7)?, "feature_names_json")?,
        native_artifact_reference: data_row.get(8)?,
        portable_artifact_reference: data_row.get(9)?,
        checksum_hexadecimal: data_row.get(10)?,
        stage: parse_stage(&data_row.get::<String>(11)?)?,
        archived_reason: data_row.get(12)?,
        promoted_at: data_row
            .get::<Option<String>>(13)?
            .map(|raw| parse_timestamp(&raw))
            .transpose()?,
        trained_at: parse_timestamp(&data_row.get::<String>(14)?)?,
        created_at: parse_timestamp(&data_row.get::<String>(15)?)?,
    })
}
