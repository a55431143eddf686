use std::fmt;
use std::rc::Rc;

/// A runtime Sol value. Values are immutable; aggregate payloads are
/// reference-counted so copies are cheap and sharing is never observable.
#[derive(Clone, Debug)]
pub enum Value {
    Nothing,
    Boolean(bool),
    Number(f64),
    String(Rc<str>),
    List(Rc<ListValue>),
    Structure(Rc<StructValue>),
}

#[derive(Clone, Debug)]
pub struct ListValue {
    pub elem: TypeDesc,
    pub items: Vec<Value>,
}

#[derive(Clone, Debug)]
pub struct StructValue {
    pub name: String,
    /// Field values in declaration order.
    pub fields: Vec<(String, Value)>,
}

impl StructValue {
    pub fn get_field(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }
}

/// The runtime description of a Sol type, used for dynamic type checks.
/// Two descriptors are equal iff their shape and arguments are equal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeDesc {
    Nothing,
    Boolean,
    Number,
    String,
    List(Box<TypeDesc>),
    Structure(String),
}

impl Value {
    pub fn string(text: impl AsRef<str>) -> Self {
        Value::String(Rc::from(text.as_ref()))
    }

    pub fn type_desc(&self) -> TypeDesc {
        match self {
            Value::Nothing => TypeDesc::Nothing,
            Value::Boolean(_) => TypeDesc::Boolean,
            Value::Number(_) => TypeDesc::Number,
            Value::String(_) => TypeDesc::String,
            Value::List(list) => TypeDesc::List(Box::new(list.elem.clone())),
            Value::Structure(instance) => TypeDesc::Structure(instance.name.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nothing => write!(f, "Nothing"),
            Value::Boolean(v) => write!(f, "{v}"),
            // f64 Display already renders integral values without a decimal
            // point and everything else in standard decimal form.
            Value::Number(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
            Value::List(list) => {
                write!(f, "[")?;
                for (idx, item) in list.items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Structure(instance) => {
                write!(f, "{}{{", instance.name)?;
                for (idx, (name, value)) in instance.fields.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Nothing => write!(f, "Nothing"),
            TypeDesc::Boolean => write!(f, "Boolean"),
            TypeDesc::Number => write!(f, "Number"),
            TypeDesc::String => write!(f, "String"),
            TypeDesc::List(elem) => write!(f, "{elem}[]"),
            TypeDesc::Structure(name) => write!(f, "{name}"),
        }
    }
}
