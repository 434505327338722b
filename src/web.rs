use std::{convert::Infallible, net::SocketAddr, path::PathBuf};

use async_graphql_warp::GraphQLResponse;
use warp::Filter;

use crate::api::Schema;

/// Serves the GraphQL schema at `/graphql`, over TLS when `tls` holds a
/// certificate and key path.
pub(crate) async fn serve(schema: Schema, addr: SocketAddr, tls: Option<(PathBuf, PathBuf)>) {
    let graphql = warp::path("graphql")
        .and(warp::post())
        .and(async_graphql_warp::graphql(schema))
        .and_then(
            |(schema, request): (Schema, async_graphql::Request)| async move {
                Ok::<_, Infallible>(GraphQLResponse::from(schema.execute(request).await))
            },
        );

    match tls {
        Some((cert, key)) => {
            warp::serve(graphql)
                .tls()
                .cert_path(cert)
                .key_path(key)
                .run(addr)
                .await;
        }
        None => warp::serve(graphql).run(addr).await,
    }
}
