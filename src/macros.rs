/// Builder style setter consuming and returning `self`.
macro_rules! impl_setter {
    ($self:ident, $field:ident, $type:ty) => {
        pub fn $field(mut $self, $field: $type) -> Self {
            $self.$field = $field;
            $self
        }
    };
}
