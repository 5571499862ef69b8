use slotmap::new_key_type;

new_key_type! {
    /// Stable identifier of an alpha sphere inside the backing store of an
    /// [`AlphaSphereSet`](crate::core::alpha_spheres::AlphaSphereSet).
    ///
    /// Unlike positional sphere indices, ids survive removals of other spheres.
    pub struct SphereId;
}
