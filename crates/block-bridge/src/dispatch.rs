use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::messages::{Request, Response};
use crate::service::BlockService;
use crate::types::BridgeError;

/// Dispatch a client request and return a response.
///
/// Any failure becomes a single `Failed` response; advisories ride along
/// successful responses.
pub fn dispatch(service: &mut BlockService, request: Request) -> Response {
    match handle_request(service, request) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "request failed");
            Response::Failed {
                message: e.to_string(),
            }
        }
    }
}

/// JSON in, JSON out.
pub fn dispatch_json(service: &mut BlockService, request: &str) -> String {
    let response = match serde_json::from_str::<Request>(request) {
        Ok(request) => dispatch(service, request),
        Err(e) => Response::Failed {
            message: BridgeError::Serialization {
                reason: e.to_string(),
            }
            .to_string(),
        },
    };
    serde_json::to_string(&response).unwrap_or_else(|e| {
        format!(r#"{{"type":"Failed","message":"serialization error: {e}"}}"#)
    })
}

fn handle_request(service: &mut BlockService, request: Request) -> Result<Response, BridgeError> {
    match request {
        Request::Analyze { svg } => {
            let analysis = service.analyze(&svg)?;
            Ok(Response::Analysis {
                path_count: analysis.path_count,
                estimated_width: analysis.bounds.width(),
                estimated_height: analysis.bounds.height(),
                scale_tier: analysis.scale_tier,
                warnings: analysis.warnings,
            })
        }

        Request::Build {
            svg,
            overrides,
            options,
            export,
        } => {
            let outcome = service.build(&svg, &overrides, options, &export)?;
            Ok(Response::Built {
                preview_id: outcome.preview_id,
                mesh_id: outcome.mesh_id,
                triangle_count: outcome.triangle_count,
                report: outcome.report,
            })
        }

        Request::FetchArtifact { id } => {
            let artifact = service.fetch(id)?;
            Ok(Response::Artifact {
                id: artifact.id,
                media_type: artifact.kind.media_type().to_string(),
                file_name: artifact.file_name(),
                data: STANDARD.encode(&artifact.bytes),
            })
        }

        Request::ReleaseArtifact { id } => {
            service.release(id)?;
            Ok(Response::Released { id })
        }
    }
}
