/// Defines the contract for the host's outgoing response.
///
/// The view only ever touches the content type; writing the body and
/// sending the response stay with the host.
pub trait HostResponse {
    /// Set the `content-type` header of the outgoing response
    fn set_content_type(&mut self, media_type: &str);
}
