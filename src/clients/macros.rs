/// Generates a client method that sends a request variant to the catalog actor
/// and awaits its oneshot reply, with tracing and channel-failure mapping.
///
/// Parameter names must match the variant's field names.
macro_rules! client_method {
    ($client:ty => fn $method:ident($($param:ident: $param_type:ty),*) -> $return_type:ty as $request:ident::$variant:ident) => {
        impl $client {
            #[tracing::instrument(skip(self))]
            pub async fn $method(&self, $($param: $param_type),*) -> Result<$return_type, $crate::catalog_actor::CatalogError> {
                tracing::debug!("Sending request");
                let (respond_to, response) = tokio::sync::oneshot::channel();
                self.sender
                    .send($request::$variant {
                        $($param,)*
                        respond_to,
                    })
                    .await
                    .map_err(|_| $crate::catalog_actor::CatalogError::ActorCommunicationError("Actor closed".to_string()))?;

                response
                    .await
                    .map_err(|_| $crate::catalog_actor::CatalogError::ActorCommunicationError("Actor dropped".to_string()))?
            }
        }
    };
}
